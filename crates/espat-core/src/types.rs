use crate::{
    Result,
    constants::{
        TAG_ALREADY_CONNECTED, TAG_ERROR, TAG_FAIL, TAG_OK, TAG_SEND_OK, TAG_WIFI_CONNECTED,
    },
    error::AtError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known response terminators, in scan priority order.
///
/// When several terminators could be suffixes of the same buffered content
/// the one listed first in [`Terminator::ALL`] wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminator {
    Ok,
    Error,
    Fail,
    SendOk,
    AlreadyConnected,
    WifiConnected,
}

impl Terminator {
    /// All terminators in the order the engine tests them.
    pub const ALL: [Terminator; 6] = [
        Terminator::Ok,
        Terminator::Error,
        Terminator::Fail,
        Terminator::SendOk,
        Terminator::AlreadyConnected,
        Terminator::WifiConnected,
    ];

    /// Exact trailing byte sequence that signals this terminator.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::Ok => TAG_OK,
            Terminator::Error => TAG_ERROR,
            Terminator::Fail => TAG_FAIL,
            Terminator::SendOk => TAG_SEND_OK,
            Terminator::AlreadyConnected => TAG_ALREADY_CONNECTED,
            Terminator::WifiConnected => TAG_WIFI_CONNECTED,
        }
    }

    /// Short human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Terminator::Ok => "OK",
            Terminator::Error => "ERROR",
            Terminator::Fail => "FAIL",
            Terminator::SendOk => "SEND OK",
            Terminator::AlreadyConnected => "ALREADY CONNECTED",
            Terminator::WifiConnected => "WIFI CONNECTED",
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one read-until exchange.
///
/// Every higher-level decision is a branch on this value. A deadline
/// expiry is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// One of the well-known terminators ended the stream.
    Terminator(Terminator),
    /// The caller-supplied tag ended the stream.
    Tag,
    /// Nothing matched before the deadline.
    TimedOut,
}

impl Outcome {
    /// True if the success terminator (`OK`) was matched.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Outcome::Terminator(Terminator::Ok)
    }

    /// True if the caller-supplied tag was matched.
    #[must_use]
    pub fn is_tag(self) -> bool {
        self == Outcome::Tag
    }

    #[must_use]
    pub fn is_timeout(self) -> bool {
        self == Outcome::TimedOut
    }

    /// The matched terminator, if any.
    #[must_use]
    pub fn terminator(self) -> Option<Terminator> {
        match self {
            Outcome::Terminator(t) => Some(t),
            _ => None,
        }
    }

    /// Require this outcome to be `expected`.
    ///
    /// # Errors
    ///
    /// Returns `AtError::UnexpectedResponse` naming both outcomes.
    pub fn expect(self, expected: Outcome) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(AtError::unexpected(expected.to_string(), self.to_string()))
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Terminator(t) => write!(f, "{t}"),
            Outcome::Tag => f.write_str("tag"),
            Outcome::TimedOut => f.write_str("timeout"),
        }
    }
}

/// Wireless operating mode (`AT+CWMODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EspMode {
    Station,
    SoftAp,
    StationSoftAp,
}

impl EspMode {
    /// Parse from the `AT+CWMODE` code (1-3).
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(EspMode::Station),
            2 => Ok(EspMode::SoftAp),
            3 => Ok(EspMode::StationSoftAp),
            _ => Err(AtError::invalid_config(format!(
                "Invalid mode: {value} (expected 1-3)"
            ))),
        }
    }

    /// Code used by `AT+CWMODE`.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            EspMode::Station => 1,
            EspMode::SoftAp => 2,
            EspMode::StationSoftAp => 3,
        }
    }

    /// Code used by `AT+CWDHCP`, which counts from zero and puts soft-AP first.
    #[must_use]
    pub fn dhcp_code(self) -> u8 {
        match self {
            EspMode::SoftAp => 0,
            EspMode::Station => 1,
            EspMode::StationSoftAp => 2,
        }
    }
}

/// Soft-AP encryption (`AT+CWSAP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encryption {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
}

impl Encryption {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Encryption::Open),
            1 => Ok(Encryption::Wep),
            2 => Ok(Encryption::WpaPsk),
            3 => Ok(Encryption::Wpa2Psk),
            4 => Ok(Encryption::WpaWpa2Psk),
            _ => Err(AtError::invalid_config(format!(
                "Invalid encryption: {value} (expected 0-4)"
            ))),
        }
    }

    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Encryption::Open => 0,
            Encryption::Wep => 1,
            Encryption::WpaPsk => 2,
            Encryption::Wpa2Psk => 3,
            Encryption::WpaWpa2Psk => 4,
        }
    }
}

/// Transport protocol for `AT+CIPSTART`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkProtocol {
    Tcp,
    Udp,
    Ssl,
}

impl LinkProtocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LinkProtocol::Tcp => "TCP",
            LinkProtocol::Udp => "UDP",
            LinkProtocol::Ssl => "SSL",
        }
    }
}

impl fmt::Display for LinkProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiplexed connection identifier (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(u8);

impl LinkId {
    /// Highest link id supported in multi-connection mode.
    pub const MAX: u8 = 4;

    /// Create a new link id with validation.
    ///
    /// # Errors
    /// Returns `AtError::InvalidConfig` if the id is above [`LinkId::MAX`].
    pub fn new(id: u8) -> Result<Self> {
        if id > Self::MAX {
            return Err(AtError::invalid_config(format!(
                "Link id must be 0-{}, got {id}",
                Self::MAX
            )));
        }
        Ok(LinkId(id))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LinkId {
    type Err = AtError;

    fn from_str(s: &str) -> Result<Self> {
        let id: u8 = s
            .trim()
            .parse()
            .map_err(|_| AtError::invalid_config(format!("Invalid link id: {s}")))?;
        LinkId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_terminator_priority_order() {
        assert_eq!(Terminator::ALL[0], Terminator::Ok);
        assert_eq!(Terminator::ALL[5], Terminator::WifiConnected);
        assert_eq!(Terminator::SendOk.as_bytes(), b"\r\nSEND OK\r\n");
    }

    #[test]
    fn test_outcome_expect() {
        let ok = Outcome::Terminator(Terminator::Ok);
        assert!(ok.expect(ok).is_ok());
        let err = Outcome::TimedOut.expect(ok).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected response: expected OK, got timeout"
        );
    }

    #[test]
    fn test_outcome_projections() {
        assert!(Outcome::Terminator(Terminator::Ok).is_ok());
        assert!(!Outcome::Terminator(Terminator::Error).is_ok());
        assert!(Outcome::Tag.is_tag());
        assert!(Outcome::TimedOut.is_timeout());
        assert_eq!(
            Outcome::Terminator(Terminator::Fail).terminator(),
            Some(Terminator::Fail)
        );
        assert_eq!(Outcome::Tag.terminator(), None);
        assert_eq!(Outcome::TimedOut.to_string(), "timeout");
    }

    #[rstest]
    #[case(1, EspMode::Station, 1)]
    #[case(2, EspMode::SoftAp, 0)]
    #[case(3, EspMode::StationSoftAp, 2)]
    fn test_esp_mode_codes(#[case] code: u8, #[case] mode: EspMode, #[case] dhcp: u8) {
        assert_eq!(EspMode::from_u8(code).unwrap(), mode);
        assert_eq!(mode.to_u8(), code);
        assert_eq!(mode.dhcp_code(), dhcp);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn test_esp_mode_invalid(#[case] code: u8) {
        assert!(EspMode::from_u8(code).is_err());
    }

    #[test]
    fn test_encryption_codes() {
        for code in 0..=4 {
            assert_eq!(Encryption::from_u8(code).unwrap().to_u8(), code);
        }
        assert!(Encryption::from_u8(5).is_err());
    }

    #[rstest]
    #[case("0", 0)]
    #[case("4", 4)]
    #[case(" 2 ", 2)]
    fn test_link_id_valid(#[case] input: &str, #[case] expected: u8) {
        let id: LinkId = input.parse().unwrap();
        assert_eq!(id.as_u8(), expected);
    }

    #[rstest]
    #[case("5")]
    #[case("-1")]
    #[case("x")]
    fn test_link_id_invalid(#[case] input: &str) {
        assert!(input.parse::<LinkId>().is_err());
    }
}
