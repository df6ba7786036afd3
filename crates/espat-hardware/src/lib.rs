//! Transport abstraction for the ESP8266 AT command engine.
//!
//! The engine never touches a UART directly. It talks to a [`Transport`],
//! which provides three primitives:
//!
//! - **write**: push a command line or payload to the module.
//! - **non-blocking read**: return whatever bytes are available right now,
//!   possibly none. "No data yet" is a normal poll result.
//! - **monotonic milliseconds**: the only clock the engine uses for deadlines.
//!
//! # Implementations
//!
//! - [`MockTransport`](mock::MockTransport): scripted replies and a virtual
//!   clock, for tests and development without hardware.
//! - `SerialTransport` (feature `hardware-serial`): a real serial port via the
//!   `serialport` crate.
//!
//! ```
//! use espat_hardware::{Transport, mock::MockTransport};
//!
//! let mut transport = MockTransport::new();
//! transport.reply_to("AT\r\n", "\r\nOK\r\n");
//! transport.write_all(b"AT\r\n").unwrap();
//!
//! let mut buf = [0u8; 16];
//! let n = transport.read_nonblocking(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"\r\nOK\r\n");
//! ```

pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;
pub mod types;

pub use espat_core::{AtError, Result};
pub use traits::Transport;
pub use types::SerialConfig;

#[cfg(feature = "hardware-serial")]
pub use serial::SerialTransport;
