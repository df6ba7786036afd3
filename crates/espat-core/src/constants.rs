//! Wire constants for the ESP8266 AT command set.
//!
//! This module collects every byte string the response engine recognizes,
//! plus the default sizes and deadlines used when no configuration is given.
//!
//! # Response Structure
//!
//! Replies from the module are free-form text closed by one of a small set
//! of terminator lines:
//!
//! ```text
//! AT+CIFSR\r\n                 <- command line (echo disabled in practice)
//! +CIFSR:STAIP,"10.0.0.7"\r\n  <- payload lines
//! \r\nOK\r\n                   <- terminator
//! ```
//!
//! Inbound socket data is announced unsolicited:
//!
//! ```text
//! +IPD,<link>,<len>,<a.b.c.d>,<port>:<len raw bytes>
//! ```
//!
//! # Usage
//!
//! ```
//! use espat_core::constants::*;
//!
//! assert_eq!(TAG_OK, b"\r\nOK\r\n");
//! assert!(DEFAULT_RING_CAPACITY.is_power_of_two());
//! ```

// ============================================================================
// Terminators
// ============================================================================

/// Command accepted.
pub const TAG_OK: &[u8] = b"\r\nOK\r\n";

/// Command rejected or malformed.
pub const TAG_ERROR: &[u8] = b"\r\nERROR\r\n";

/// Command understood but the operation failed (e.g. join refused).
pub const TAG_FAIL: &[u8] = b"\r\nFAIL\r\n";

/// Payload handed to the network stack after `AT+CIPSEND`.
pub const TAG_SEND_OK: &[u8] = b"\r\nSEND OK\r\n";

/// `AT+CIPSTART` on a link that is already open.
pub const TAG_ALREADY_CONNECTED: &[u8] = b"ALREADY CONNECTED\r\n";

/// Station associated with an access point.
pub const TAG_WIFI_CONNECTED: &[u8] = b"WIFI CONNECTED\r\n";

// ============================================================================
// Ad-hoc tags
// ============================================================================

/// Station obtained a DHCP lease.
pub const TAG_WIFI_GOT_IP: &[u8] = b"WIFI GOT IP\r\n";

/// Prompt sent by `AT+CIPSEND` when it is ready for the payload.
pub const TAG_SEND_PROMPT: &[u8] = b">";

/// Unsolicited inbound data notification prefix.
pub const TAG_INBOUND_PREFIX: &[u8] = b"+IPD,";

/// Separator between the inbound header and its raw payload.
pub const TAG_INBOUND_SEPARATOR: &[u8] = b":";

/// Field separator inside listing responses.
pub const TAG_FIELD_SEPARATOR: &[u8] = b",";

/// Line ending used by both directions.
pub const LINE_ENDING: &[u8] = b"\r\n";

// ============================================================================
// Sizes
// ============================================================================

/// Default ring buffer capacity. Must be a power of two.
pub const DEFAULT_RING_CAPACITY: usize = 512;

/// Longest command line accepted by the builder, line ending included.
pub const DEFAULT_MAX_COMMAND_LEN: usize = 256;

/// Default number of records kept by a client listing.
pub const DEFAULT_MAX_CLIENTS: usize = 4;

/// Default record width: a dotted IPv4 quad.
pub const DEFAULT_RECORD_WIDTH: usize = 15;

// ============================================================================
// Deadlines (milliseconds)
// ============================================================================

/// Default deadline for simple commands.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Deadline for the start tag phase of a payload extraction.
pub const DEFAULT_START_TAG_TIMEOUT_MS: u64 = 1000;

/// Deadline for the end tag phase of a payload extraction.
pub const DEFAULT_END_TAG_TIMEOUT_MS: u64 = 500;

/// Deadline for flushing the remainder of a response after extraction.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 2000;

/// Deadline for each field and line of a client listing.
pub const DEFAULT_LISTING_TIMEOUT_MS: u64 = 200;
