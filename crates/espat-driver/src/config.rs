//! Driver deadlines and retry policy.

use serde::{Deserialize, Serialize};

/// Tunables for [`EspDriver`](crate::EspDriver).
///
/// The defaults match the response times of stock 1.x AT firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Deadline for ordinary configuration commands.
    pub command_timeout_ms: u64,

    /// `AT` probes sent by `init` before giving up.
    pub init_attempts: u32,

    /// Pause between failed probes.
    pub probe_interval_ms: u64,

    /// Pause before `reset` flushes stale input and starts its sequence.
    pub reset_delay_ms: u64,

    /// Pause after the mode and DHCP commands of `reset`.
    pub reset_settle_ms: u64,

    /// Deadline for `WIFI CONNECTED` after `AT+CWJAP_CUR`.
    pub join_timeout_ms: u64,

    /// Deadline for each of `WIFI GOT IP` and the final `OK` after joining.
    pub join_followup_timeout_ms: u64,

    /// Deadline for `AT+CWSAP_DEF`.
    pub start_ap_timeout_ms: u64,

    /// Deadline for the `>` prompt and `SEND OK` on an open link.
    pub send_timeout_ms: u64,

    /// Deadline for the `>` prompt and `SEND OK` on a UDP send with an
    /// explicit destination.
    pub send_to_timeout_ms: u64,

    /// Deadline for the reply that trails `ALREADY CONNECTED`.
    pub settle_timeout_ms: u64,

    /// Lease time in minutes set by `set_dhcp_range`.
    pub dhcp_lease_minutes: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 1000,
            init_attempts: 5,
            probe_interval_ms: 1000,
            reset_delay_ms: 1000,
            reset_settle_ms: 200,
            join_timeout_ms: 20_000,
            join_followup_timeout_ms: 5000,
            start_ap_timeout_ms: 10_000,
            send_timeout_ms: 2000,
            send_to_timeout_ms: 200,
            settle_timeout_ms: 200,
            dhcp_lease_minutes: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: DriverConfig = serde_json::from_str(r#"{"join_timeout_ms": 30000}"#).unwrap();
        assert_eq!(config.join_timeout_ms, 30_000);
        assert_eq!(config.init_attempts, 5);
        assert_eq!(config.send_timeout_ms, 2000);
        assert_eq!(config.reset_settle_ms, 200);
    }
}
