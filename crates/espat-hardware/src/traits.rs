//! Transport trait definition.
//!
//! This module defines the contract between the AT command engine and the
//! byte channel that reaches the module. The engine is single-threaded and
//! cooperative: it polls [`Transport::read_nonblocking`] in a loop and checks
//! [`Transport::now_ms`] on every iteration, so an implementation must never
//! block waiting for data.

use crate::Result;

/// Byte channel to an AT-command co-processor.
///
/// Each transport owns exactly one link. Driving several modules at once
/// means several transports, each with its own engine session.
///
/// # Examples
///
/// ```
/// use espat_hardware::{Transport, Result};
///
/// fn probe<T: Transport>(transport: &mut T) -> Result<usize> {
///     transport.write_all(b"AT\r\n")?;
///     let mut buf = [0u8; 32];
///     transport.read_nonblocking(&mut buf)
/// }
/// ```
pub trait Transport {
    /// Send all bytes to the module.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel fails.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Copy immediately available bytes into `buf`.
    ///
    /// Returns the number of bytes copied, which is zero when nothing has
    /// arrived yet. Never blocks past "nothing currently available".
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel fails.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Monotonic milliseconds. Only differences are meaningful.
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds.
    ///
    /// The default busy-waits on [`Transport::now_ms`], matching the polling
    /// model of the engine.
    fn delay_ms(&mut self, ms: u64) {
        let start = self.now_ms();
        while self.now_ms().saturating_sub(start) < ms {
            std::hint::spin_loop();
        }
    }

    /// Discard every byte that is immediately available.
    ///
    /// Returns the number of bytes discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel fails.
    fn drain_input(&mut self) -> Result<usize> {
        let mut scratch = [0u8; 64];
        let mut discarded = 0;
        loop {
            let n = self.read_nonblocking(&mut scratch)?;
            if n == 0 {
                break;
            }
            discarded += n;
        }
        if discarded > 0 {
            tracing::trace!("Discarded {} stale bytes", discarded);
        }
        Ok(discarded)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_nonblocking(buf)
    }

    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn delay_ms(&mut self, ms: u64) {
        (**self).delay_ms(ms)
    }

    fn drain_input(&mut self) -> Result<usize> {
        (**self).drain_input()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_nonblocking(buf)
    }

    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn delay_ms(&mut self, ms: u64) {
        (**self).delay_ms(ms)
    }

    fn drain_input(&mut self) -> Result<usize> {
        (**self).drain_input()
    }
}
