//! Payload extraction between a start tag and an end tag.
//!
//! Many replies carry one value framed by fixed text, e.g.
//! `+CIFSR:STAIP,"10.0.0.7"\r\n`. The extractor runs the engine to the start
//! tag, then again to the end tag, and copies what came in between.

use crate::builder::AtCommand;
use crate::session::AtSession;
use espat_core::{AtError, Outcome, Result, Terminator};
use espat_hardware::Transport;
use tracing::{debug, warn};

/// Which half of an extraction ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPhase {
    StartTag,
    EndTag,
}

/// Result of [`AtSession::extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// `len` bytes were copied and zero-terminated. `truncated` is set when
    /// the value did not fit.
    Extracted { len: usize, truncated: bool },
    /// The reply ended with a terminator before the start tag appeared.
    StartTagNotFound(Terminator),
    /// The reply ended with a terminator before the end tag appeared.
    EndTagNotFound(Terminator),
    /// A phase hit its deadline.
    TimedOut(ExtractPhase),
    /// The value outgrew the reply buffer and its leading bytes were lost.
    /// Nothing is copied.
    Overflowed,
}

impl ExtractOutcome {
    /// True if a value was extracted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractOutcome::Extracted { .. })
    }

    /// Length of the extracted value, if any.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            ExtractOutcome::Extracted { len, .. } => Some(*len),
            _ => None,
        }
    }

    fn from_miss(phase: ExtractPhase, outcome: Outcome) -> Self {
        match (phase, outcome.terminator()) {
            (ExtractPhase::StartTag, Some(t)) => ExtractOutcome::StartTagNotFound(t),
            (ExtractPhase::EndTag, Some(t)) => ExtractOutcome::EndTagNotFound(t),
            (phase, None) => ExtractOutcome::TimedOut(phase),
        }
    }
}

impl<T: Transport> AtSession<T> {
    /// Optionally send `cmd`, then copy the bytes between `start_tag` and
    /// `end_tag` into `out`.
    ///
    /// At most `out.len() - 1` bytes are copied and a zero byte always
    /// follows them; nothing is written past `out`. A value that does not
    /// fit the session's ring cannot be recovered and yields
    /// [`ExtractOutcome::Overflowed`]. After the end tag the rest of the
    /// reply is read and discarded.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InvalidConfig` if `out` is empty, or a transport
    /// error. Missing tags and timeouts are reported in the outcome.
    pub fn extract(
        &mut self,
        cmd: Option<&AtCommand>,
        start_tag: &[u8],
        end_tag: &[u8],
        out: &mut [u8],
    ) -> Result<ExtractOutcome> {
        if out.is_empty() {
            return Err(AtError::invalid_config(
                "extraction output must hold at least the zero terminator",
            ));
        }
        out[0] = 0;

        if let Some(cmd) = cmd {
            self.write_command(cmd)?;
        }

        let (start_timeout, end_timeout, drain_timeout) = {
            let c = self.config();
            (c.start_tag_timeout_ms, c.end_tag_timeout_ms, c.drain_timeout_ms)
        };

        let outcome = self.read_until(start_timeout, Some(start_tag), true)?;
        if !outcome.is_tag() {
            let miss = ExtractOutcome::from_miss(ExtractPhase::StartTag, outcome);
            debug!("Start tag {:?} not found: {:?}", start_tag.escape_ascii().to_string(), miss);
            return Ok(miss);
        }

        let outcome = self.read_until(end_timeout, Some(end_tag), true)?;
        if !outcome.is_tag() {
            let miss = ExtractOutcome::from_miss(ExtractPhase::EndTag, outcome);
            warn!("End tag {:?} not found: {:?}", end_tag.escape_ascii().to_string(), miss);
            return Ok(miss);
        }

        if self.last_read_overflowed() {
            warn!(
                "Extracted value exceeds {} byte buffer, discarding it",
                self.buffer().capacity()
            );
            let rest = self.read_until(drain_timeout, None, true)?;
            debug!("Reply closed with {}", rest);
            return Ok(ExtractOutcome::Overflowed);
        }

        let value_len = self.buffer().used().saturating_sub(end_tag.len());
        let len = value_len.min(out.len() - 1);
        self.buffer().peek_into(&mut out[..len])?;
        out[len] = 0;
        let truncated = len < value_len;
        if truncated {
            warn!("Extracted value truncated from {} to {} bytes", value_len, len);
        }

        let rest = self.read_until(drain_timeout, None, true)?;
        debug!("Extracted {} bytes, reply closed with {}", len, rest);

        Ok(ExtractOutcome::Extracted { len, truncated })
    }

    /// [`extract`](Self::extract) into a fresh buffer of `capacity` bytes,
    /// returning the value as text on success.
    pub fn extract_text(
        &mut self,
        cmd: Option<&AtCommand>,
        start_tag: &[u8],
        end_tag: &[u8],
        capacity: usize,
    ) -> Result<(ExtractOutcome, Option<String>)> {
        let mut out = vec![0u8; capacity + 1];
        let outcome = self.extract(cmd, start_tag, end_tag, &mut out)?;
        let text = outcome
            .len()
            .map(|len| String::from_utf8_lossy(&out[..len]).into_owned());
        Ok((outcome, text))
    }
}
