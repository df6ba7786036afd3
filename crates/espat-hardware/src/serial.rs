//! Serial port transport.
//!
//! Wraps a `serialport` handle so that reads never block: the port is opened
//! with a zero timeout and reads are skipped while the driver reports no
//! pending input.

use crate::{AtError, Result, traits::Transport, types::SerialConfig};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Transport over a local serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
    epoch: Instant,
}

impl SerialTransport {
    /// Open the port described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AtError::Transport` if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        info!(
            "Opening serial port {} at {} baud",
            config.path, config.baud_rate
        );
        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|e| AtError::transport(format!("{}: {e}", config.path)))?;

        Ok(Self {
            port,
            path: config.path.clone(),
            epoch: Instant::now(),
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        // Wait until the bytes are on the wire before timing the reply.
        self.port.flush()?;
        Ok(())
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| AtError::transport(format!("{}: {e}", self.path)))?;
        if available == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(available as usize);
        match self.port.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => {
                debug!("Serial read on {} failed: {}", self.path, e);
                Err(e.into())
            }
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
