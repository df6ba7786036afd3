//! Inbound socket data framing.
//!
//! With multiple connections and remote info enabled, the module announces
//! received data unsolicited:
//!
//! ```text
//! +IPD,0,3,10.0.0.1,80:xyz
//! │    │ │ │        │  └── exactly <len> raw bytes
//! │    │ │ │        └───── remote port
//! │    │ │ └────────────── remote IPv4 address
//! │    │ └──────────────── payload length
//! │    └────────────────── link id
//! └─────────────────────── notification prefix
//! ```
//!
//! [`AtSession::wait_for_data`] runs three phases, each with its own
//! deadline: find the prefix, read the header up to `:`, then read the
//! payload straight from the transport. The payload bypasses the ring
//! because it may contain anything, including bytes that look like tags.
//!
//! The header is read one byte at a time and the read stops on the `:`, so
//! no payload byte is ever left behind in the ring.

use crate::session::AtSession;
use espat_core::constants::{TAG_INBOUND_PREFIX, TAG_INBOUND_SEPARATOR};
use espat_core::{AtError, LinkId, Result};
use espat_hardware::Transport;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;
use tracing::{debug, warn};

/// Parsed `+IPD` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub link: LinkId,
    pub length: usize,
    pub remote: SocketAddrV4,
}

impl FromStr for FrameHeader {
    type Err = AtError;

    /// Parse `link,length,a.b.c.d,port`.
    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').collect();
        let [link, length, ip, port] = fields.as_slice() else {
            return Err(AtError::malformed_header(format!(
                "expected 4 fields, got {} in {s:?}",
                fields.len()
            )));
        };

        let link = link
            .parse::<LinkId>()
            .map_err(|_| AtError::malformed_header(format!("bad link id {link:?}")))?;
        let length = length
            .parse::<usize>()
            .map_err(|_| AtError::malformed_header(format!("bad length {length:?}")))?;
        let ip = ip
            .parse::<Ipv4Addr>()
            .map_err(|_| AtError::malformed_header(format!("bad address {ip:?}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| AtError::malformed_header(format!("bad port {port:?}")))?;

        Ok(FrameHeader {
            link,
            length,
            remote: SocketAddrV4::new(ip, port),
        })
    }
}

/// Payload delivered by one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundData {
    pub header: FrameHeader,
    /// Bytes read from the transport.
    pub received: usize,
    /// Bytes written to the caller's buffer.
    pub stored: usize,
}

impl InboundData {
    /// All announced bytes arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.received == self.header.length
    }

    /// Some bytes arrived but did not fit the caller's buffer.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.stored < self.received
    }
}

/// Result of [`AtSession::wait_for_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The full payload was read.
    Received(InboundData),
    /// The payload deadline passed before all announced bytes arrived.
    Partial(InboundData),
    /// No notification prefix before the deadline.
    NoData,
    /// The prefix arrived but the header separator did not.
    HeaderTimedOut,
}

impl<T: Transport> AtSession<T> {
    /// Wait for one inbound data notification and read its payload into
    /// `out`.
    ///
    /// Payload bytes beyond `out.len()` are still consumed from the
    /// transport so the stream stays aligned; they are counted in
    /// `received` but not stored.
    ///
    /// # Errors
    ///
    /// Returns `AtError::MalformedHeader` if the header does not parse, or a
    /// transport error.
    pub fn wait_for_data(&mut self, timeout_ms: u64, out: &mut [u8]) -> Result<InboundOutcome> {
        if !self
            .read_until(timeout_ms, Some(TAG_INBOUND_PREFIX), false)?
            .is_tag()
        {
            return Ok(InboundOutcome::NoData);
        }

        if !self
            .read_until(timeout_ms, Some(TAG_INBOUND_SEPARATOR), false)?
            .is_tag()
        {
            warn!("Inbound header incomplete after {}ms", timeout_ms);
            return Ok(InboundOutcome::HeaderTimedOut);
        }

        let header_len = self.buffer().used() - TAG_INBOUND_SEPARATOR.len();
        let raw = self.buffer().peek_many(header_len)?;
        self.buffer_mut().clear();
        let text = String::from_utf8_lossy(&raw);
        let header: FrameHeader = text.parse()?;
        debug!(
            "Inbound on link {}: {} bytes from {}",
            header.link, header.length, header.remote
        );

        let (received, stored) = self.read_payload(timeout_ms, header.length, out)?;
        let data = InboundData {
            header,
            received,
            stored,
        };
        if data.is_truncated() {
            warn!(
                "Inbound payload of {} bytes truncated to {}",
                received, stored
            );
        }
        if data.is_complete() {
            Ok(InboundOutcome::Received(data))
        } else {
            warn!(
                "Inbound payload short: {} of {} bytes",
                received, header.length
            );
            Ok(InboundOutcome::Partial(data))
        }
    }

    /// Read exactly `length` bytes, or fewer if the deadline passes.
    fn read_payload(
        &mut self,
        timeout_ms: u64,
        length: usize,
        out: &mut [u8],
    ) -> Result<(usize, usize)> {
        let start = self.transport().now_ms();
        let mut received = 0;
        let mut stored = 0;
        let mut scratch = [0u8; 64];

        while received < length && self.transport().now_ms().saturating_sub(start) < timeout_ms {
            let want = length - received;
            let n = if stored < out.len() {
                let end = out.len().min(stored + want);
                let n = self.transport_mut().read_nonblocking(&mut out[stored..end])?;
                stored += n;
                n
            } else {
                let end = scratch.len().min(want);
                self.transport_mut().read_nonblocking(&mut scratch[..end])?
            };
            received += n;
        }
        Ok((received, stored))
    }
}
