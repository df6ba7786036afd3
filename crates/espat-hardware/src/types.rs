//! Serial link settings.

use serde::{Deserialize, Serialize};

/// Baud rate the ESP8266 AT firmware ships with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g., "/dev/ttyUSB0", "COM3").
    pub path: String,

    /// Line speed in bits per second.
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
    }

    #[test]
    fn test_serial_config_partial_json() {
        let config: SerialConfig = serde_json::from_str(r#"{"path":"/dev/ttyS1"}"#).unwrap();
        assert_eq!(config.path, "/dev/ttyS1");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
    }
}
