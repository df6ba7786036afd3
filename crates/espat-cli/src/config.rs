//! CLI configuration file.
//!
//! ```json
//! {
//!   "serial": { "path": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "session": { "ring_capacity": 1024 },
//!   "driver": { "join_timeout_ms": 30000 }
//! }
//! ```
//!
//! Every section and field is optional.

use anyhow::{Context, Result};
use espat_driver::DriverConfig;
use espat_hardware::SerialConfig;
use espat_protocol::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub serial: SerialConfig,
    pub session: SessionConfig,
    pub driver: DriverConfig,
}

impl CliConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.session.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, port: Option<String>, baud: Option<u32>) -> Self {
        if let Some(port) = port {
            self.serial.path = port;
        }
        if let Some(baud) = baud {
            self.serial.baud_rate = baud;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(CliConfig::from_json("{}").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = CliConfig::from_json(
            r#"{"serial": {"baud_rate": 9600}, "session": {"max_clients": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.path, SerialConfig::default().path);
        assert_eq!(config.session.max_clients, 8);
        assert_eq!(config.driver, DriverConfig::default());
    }

    #[test]
    fn test_invalid_session_rejected() {
        let err = CliConfig::from_json(r#"{"session": {"ring_capacity": 500}}"#).unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_overrides() {
        let config = CliConfig::default().with_overrides(Some("/dev/ttyAMA0".into()), None);
        assert_eq!(config.serial.path, "/dev/ttyAMA0");
        assert_eq!(config.serial.baud_rate, SerialConfig::default().baud_rate);
    }

    #[test]
    fn test_missing_file() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/espat.json"))).unwrap_err();
        assert!(err.to_string().contains("reading /nonexistent/espat.json"));
    }
}
