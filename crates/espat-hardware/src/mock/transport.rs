//! Mock serial link implementation for testing and development.
//!
//! This module provides a simulated ESP8266 link whose inbound bytes and
//! clock are fully controlled by the test.

use crate::{AtError, Result, traits::Transport};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Mock serial link for testing and development.
///
/// Inbound bytes come from three sources:
///
/// - [`push_rx`](MockTransport::push_rx): available on the next poll.
/// - [`push_rx_at`](MockTransport::push_rx_at): released once the clock
///   reaches the given millisecond.
/// - [`reply_to`](MockTransport::reply_to): queued when a matching command is
///   written. Each reply fires once, in registration order.
///
/// By default the clock is virtual and advances one tick on every
/// [`read_nonblocking`](Transport::read_nonblocking) call, so deadline tests
/// are exact and run instantly. [`MockTransport::realtime`] uses the wall
/// clock instead.
///
/// # Examples
///
/// ```
/// use espat_hardware::{Transport, mock::MockTransport};
///
/// let mut link = MockTransport::new();
/// link.push_rx_at(10, "ready\r\n");
///
/// let mut buf = [0u8; 16];
/// assert_eq!(link.read_nonblocking(&mut buf).unwrap(), 0);
///
/// link.advance(10);
/// let n = link.read_nonblocking(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"ready\r\n");
/// ```
#[derive(Debug)]
pub struct MockTransport {
    clock: Clock,
    rx: VecDeque<u8>,
    /// Pending chunks keyed by release time, sorted ascending.
    scheduled: Vec<(u64, Vec<u8>)>,
    replies: Vec<Reply>,
    written: Vec<u8>,
    max_read: usize,
    fail_writes: bool,
    polls: usize,
}

#[derive(Debug)]
enum Clock {
    Virtual { now: u64, tick_ms: u64 },
    Real(Instant),
}

#[derive(Debug)]
struct Reply {
    trigger: Vec<u8>,
    response: Vec<u8>,
    delay_ms: u64,
}

impl MockTransport {
    /// Create a mock link with a virtual clock ticking 1 ms per poll.
    pub fn new() -> Self {
        Self::with_tick(1)
    }

    /// Create a mock link with a virtual clock ticking `tick_ms` per poll.
    pub fn with_tick(tick_ms: u64) -> Self {
        Self::with_clock(Clock::Virtual { now: 0, tick_ms })
    }

    /// Create a mock link driven by the wall clock.
    pub fn realtime() -> Self {
        Self::with_clock(Clock::Real(Instant::now()))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            rx: VecDeque::new(),
            scheduled: Vec::new(),
            replies: Vec::new(),
            written: Vec::new(),
            max_read: usize::MAX,
            fail_writes: false,
            polls: 0,
        }
    }

    /// Make bytes available on the next poll.
    pub fn push_rx(&mut self, bytes: impl AsRef<[u8]>) {
        self.rx.extend(bytes.as_ref());
    }

    /// Make bytes available once the clock reaches `at_ms`.
    pub fn push_rx_at(&mut self, at_ms: u64, bytes: impl AsRef<[u8]>) {
        let pos = self.scheduled.partition_point(|(t, _)| *t <= at_ms);
        self.scheduled.insert(pos, (at_ms, bytes.as_ref().to_vec()));
    }

    /// Queue `response` the first time a write starts with `trigger`.
    pub fn reply_to(&mut self, trigger: impl AsRef<[u8]>, response: impl AsRef<[u8]>) {
        self.reply_to_after(trigger, 0, response);
    }

    /// Like [`reply_to`](Self::reply_to), but the response is released
    /// `delay_ms` after the triggering write.
    pub fn reply_to_after(
        &mut self,
        trigger: impl AsRef<[u8]>,
        delay_ms: u64,
        response: impl AsRef<[u8]>,
    ) {
        self.replies.push(Reply {
            trigger: trigger.as_ref().to_vec(),
            response: response.as_ref().to_vec(),
            delay_ms,
        });
    }

    /// Limit how many bytes a single poll may return.
    pub fn set_max_read(&mut self, max_read: usize) {
        self.max_read = max_read.max(1);
    }

    /// Make every subsequent write fail with a broken pipe.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Advance the virtual clock. No effect on a realtime mock.
    pub fn advance(&mut self, ms: u64) {
        if let Clock::Virtual { now, .. } = &mut self.clock {
            *now += ms;
        }
        self.release_due();
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Everything written so far, lossily decoded.
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Take and clear the write log.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Bytes not yet read, including scheduled ones.
    pub fn pending(&self) -> usize {
        self.rx.len() + self.scheduled.iter().map(|(_, b)| b.len()).sum::<usize>()
    }

    /// Replies registered but not yet triggered.
    pub fn unused_replies(&self) -> usize {
        self.replies.len()
    }

    /// Number of read polls served.
    pub fn polls(&self) -> usize {
        self.polls
    }

    fn release_due(&mut self) {
        let now = self.now_ms();
        let due = self.scheduled.partition_point(|(t, _)| *t <= now);
        for (_, chunk) in self.scheduled.drain(..due) {
            self.rx.extend(chunk);
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(AtError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock link closed",
            )));
        }
        self.written.extend_from_slice(bytes);

        if let Some(idx) = self
            .replies
            .iter()
            .position(|r| bytes.starts_with(&r.trigger))
        {
            let reply = self.replies.remove(idx);
            let at = self.now_ms() + reply.delay_ms;
            self.push_rx_at(at, reply.response);
            self.release_due();
        }
        Ok(())
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.polls += 1;
        if let Clock::Virtual { now, tick_ms } = &mut self.clock {
            *now += *tick_ms;
        }
        self.release_due();

        let n = buf.len().min(self.rx.len()).min(self.max_read);
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn now_ms(&self) -> u64 {
        match &self.clock {
            Clock::Virtual { now, .. } => *now,
            Clock::Real(epoch) => epoch.elapsed().as_millis() as u64,
        }
    }

    fn delay_ms(&mut self, ms: u64) {
        match self.clock {
            Clock::Virtual { .. } => self.advance(ms),
            Clock::Real(_) => {
                std::thread::sleep(Duration::from_millis(ms));
                self.release_due();
            }
        }
    }
}
