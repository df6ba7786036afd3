//! Session configuration.
//!
//! All sizes and deadlines the engine uses beyond the per-call timeout live
//! here. Values are checked once, when the session is built; a bad value is
//! a reported error, never silently coerced.
//!
//! ```
//! use espat_protocol::SessionConfig;
//!
//! let config: SessionConfig = serde_json::from_str(r#"{"ring_capacity": 1024}"#).unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.end_tag_timeout_ms, 500);
//! ```

use espat_core::constants::{
    DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_END_TAG_TIMEOUT_MS, DEFAULT_LISTING_TIMEOUT_MS,
    DEFAULT_MAX_CLIENTS, DEFAULT_MAX_COMMAND_LEN, DEFAULT_RECORD_WIDTH, DEFAULT_RING_CAPACITY,
    DEFAULT_START_TAG_TIMEOUT_MS,
};
use espat_core::{AtError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for one [`AtSession`](crate::AtSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ring buffer slots. Must be a power of two.
    pub ring_capacity: usize,

    /// Longest command line, line ending included.
    pub max_command_len: usize,

    /// Deadline for finding the start tag of an extraction.
    pub start_tag_timeout_ms: u64,

    /// Deadline for finding the end tag of an extraction.
    pub end_tag_timeout_ms: u64,

    /// Deadline for flushing the rest of a reply after an extraction.
    pub drain_timeout_ms: u64,

    /// Deadline for each field and line of a listing.
    pub listing_timeout_ms: u64,

    /// Records kept by a listing.
    pub max_clients: usize,

    /// Longest record kept by a listing; longer ones are cut.
    pub record_width: usize,
}

impl SessionConfig {
    /// Check every value.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InvalidCapacity` for a bad ring size and
    /// `AtError::InvalidConfig` for anything else out of range.
    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity < 2 || !self.ring_capacity.is_power_of_two() {
            return Err(AtError::invalid_capacity(self.ring_capacity));
        }
        if self.max_command_len < 3 {
            return Err(AtError::invalid_config(format!(
                "max_command_len must be at least 3, got {}",
                self.max_command_len
            )));
        }
        if self.max_clients == 0 {
            return Err(AtError::invalid_config("max_clients must be non-zero"));
        }
        if self.record_width == 0 || self.record_width >= self.ring_capacity {
            return Err(AtError::invalid_config(format!(
                "record_width must be 1-{}, got {}",
                self.ring_capacity - 1,
                self.record_width
            )));
        }
        for (name, value) in [
            ("start_tag_timeout_ms", self.start_tag_timeout_ms),
            ("end_tag_timeout_ms", self.end_tag_timeout_ms),
            ("drain_timeout_ms", self.drain_timeout_ms),
            ("listing_timeout_ms", self.listing_timeout_ms),
        ] {
            if value == 0 {
                return Err(AtError::invalid_config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
            start_tag_timeout_ms: DEFAULT_START_TAG_TIMEOUT_MS,
            end_tag_timeout_ms: DEFAULT_END_TAG_TIMEOUT_MS,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
            listing_timeout_ms: DEFAULT_LISTING_TIMEOUT_MS,
            max_clients: DEFAULT_MAX_CLIENTS,
            record_width: DEFAULT_RECORD_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_non_power_of_two_ring() {
        let config = SessionConfig {
            ring_capacity: 500,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AtError::InvalidCapacity { capacity: 500 })
        ));
    }

    #[test]
    fn test_rejects_record_wider_than_ring() {
        let config = SessionConfig {
            ring_capacity: 16,
            record_width: 16,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AtError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_deadline() {
        let config = SessionConfig {
            drain_timeout_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("drain_timeout_ms"));
    }

    #[test]
    fn test_rejects_empty_table() {
        let config = SessionConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
