//! Command/response engine.
//!
//! An [`AtSession`] owns one transport and one ring buffer. It sends a
//! command line, then pumps single bytes from the transport into the ring
//! until a known terminator (or a caller-supplied tag) is a suffix of the
//! buffered bytes, or the deadline passes.
//!
//! # Exchange State Machine
//!
//! ```text
//! ┌──────┐ clear ring,  ┌─────────┐ write ok  ┌─────────┐ tag suffix   ┌──────────────┐
//! │ Idle │─────────────>│ Sending │──────────>│ Reading │─────────────>│ Tag          │
//! └──────┘ write line   └─────────┘           └─────────┘              ├──────────────┤
//!                                               │  │   terminator      │ Terminator(t)│
//!                                               │  └──────────────────>├──────────────┤
//!                                               │     now - start      │ TimedOut     │
//!                                               └─────────────────────>└──────────────┘
//!                                                     >= timeout
//! ```
//!
//! Each poll fetches at most one byte, so the ring never holds bytes past the
//! match: whatever follows stays in the transport for the next read.
//!
//! The session is not reentrant. One exchange runs at a time and every call
//! takes `&mut self`; several links need several sessions.
//!
//! # Example
//!
//! ```
//! use espat_hardware::mock::MockTransport;
//! use espat_protocol::{AtCommand, AtSession};
//! use espat_core::{Outcome, Terminator};
//!
//! let mut link = MockTransport::new();
//! link.reply_to("AT\r\n", "\r\nOK\r\n");
//!
//! let mut session = AtSession::new(link).unwrap();
//! let outcome = session.send_command(&AtCommand::new("AT"), 1000).unwrap();
//! assert_eq!(outcome, Outcome::Terminator(Terminator::Ok));
//! ```

use crate::builder::AtCommand;
use crate::config::SessionConfig;
use crate::ring_buffer::RingBuffer;
use espat_core::{Outcome, Result, Terminator};
use espat_hardware::Transport;
use tracing::{debug, trace, warn};

/// One AT link: transport, reply buffer and configuration.
#[derive(Debug)]
pub struct AtSession<T: Transport> {
    transport: T,
    ring: RingBuffer,
    config: SessionConfig,
    overflowed: bool,
}

impl<T: Transport> AtSession<T> {
    /// Create a session with the default configuration.
    ///
    /// # Errors
    ///
    /// Only fails if the default configuration is invalid, which it is not.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns the error from [`SessionConfig::validate`].
    pub fn with_config(transport: T, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let ring = RingBuffer::new(config.ring_capacity)?;
        Ok(Self {
            transport,
            ring,
            config,
            overflowed: false,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Bytes buffered by the last read.
    pub fn buffer(&self) -> &RingBuffer {
        &self.ring
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut RingBuffer {
        &mut self.ring
    }

    /// True if the last [`read_until`](Self::read_until) dropped bytes
    /// because the reply outgrew the ring. The buffer then holds only the
    /// newest `capacity - 1` bytes of that read.
    pub fn last_read_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Give the transport back.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Clear the ring and write `cmd` as one line.
    ///
    /// # Errors
    ///
    /// Returns `AtError::CommandTooLong` or a transport error.
    pub fn write_command(&mut self, cmd: &AtCommand) -> Result<()> {
        let line = cmd.encode(self.config.max_command_len)?;
        self.ring.clear();
        trace!("-> {}", cmd);
        self.transport.write_all(&line)
    }

    /// Write bytes verbatim, e.g. a payload after the `>` prompt.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("-> {} raw bytes", bytes.len());
        self.transport.write_all(bytes)
    }

    /// Send `cmd` and classify the reply by the well-known terminators.
    ///
    /// # Errors
    ///
    /// Returns `AtError::CommandTooLong` or a transport error. A deadline
    /// expiry is `Ok(Outcome::TimedOut)`.
    pub fn send_command(&mut self, cmd: &AtCommand, timeout_ms: u64) -> Result<Outcome> {
        self.write_command(cmd)?;
        let outcome = self.read_until(timeout_ms, None, true)?;
        debug!("{} -> {}", cmd, outcome);
        Ok(outcome)
    }

    /// Read until `tag` or, if `scan_terminators` is set, a well-known
    /// terminator ends the buffered bytes, or `timeout_ms` elapses.
    ///
    /// The ring is cleared first, so afterwards it holds exactly the bytes
    /// read by this call, match included. A caller tag is tested before the
    /// terminators; among terminators the first in [`Terminator::ALL`] wins.
    ///
    /// If a reply outgrows the ring the oldest bytes are dropped and
    /// [`last_read_overflowed`](Self::last_read_overflowed) reports it;
    /// suffix matching is unaffected.
    ///
    /// # Errors
    ///
    /// Returns a transport error. A deadline expiry is `Ok(Outcome::TimedOut)`.
    pub fn read_until(
        &mut self,
        timeout_ms: u64,
        tag: Option<&[u8]>,
        scan_terminators: bool,
    ) -> Result<Outcome> {
        self.ring.clear();
        self.overflowed = false;
        let start = self.transport.now_ms();
        let mut byte = [0u8; 1];

        while self.transport.now_ms().saturating_sub(start) < timeout_ms {
            if self.transport.read_nonblocking(&mut byte)? == 0 {
                continue;
            }
            if self.ring.put_evicting(byte[0]) && !self.overflowed {
                self.overflowed = true;
                warn!(
                    "Reply exceeds {} byte buffer, dropping oldest bytes",
                    self.ring.capacity()
                );
            }
            if let Some(outcome) = self.classify(tag, scan_terminators) {
                trace!(
                    "<- {} after {}ms ({} bytes)",
                    outcome,
                    self.transport.now_ms().saturating_sub(start),
                    self.ring.used()
                );
                return Ok(outcome);
            }
        }

        warn!(
            "Read timed out after {}ms with {} bytes buffered",
            timeout_ms,
            self.ring.used()
        );
        Ok(Outcome::TimedOut)
    }

    fn classify(&self, tag: Option<&[u8]>, scan_terminators: bool) -> Option<Outcome> {
        if let Some(tag) = tag
            && self.ring.ends_with(tag)
        {
            return Some(Outcome::Tag);
        }
        if scan_terminators {
            return Terminator::ALL
                .into_iter()
                .find(|t| self.ring.ends_with(t.as_bytes()))
                .map(Outcome::Terminator);
        }
        None
    }
}
