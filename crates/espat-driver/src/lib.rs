//! High-level ESP8266 operations over the AT command engine.
//!
//! [`EspDriver`] wraps an [`AtSession`](espat_protocol::AtSession) and turns
//! each module feature (joining a network, opening links, sending data,
//! querying addresses) into one method returning a typed result.
//!
//! # Example
//!
//! ```
//! use espat_driver::EspDriver;
//! use espat_hardware::mock::MockTransport;
//!
//! let mut link = MockTransport::new();
//! link.reply_to("AT+CIFSR", "+CIFSR:STAIP,\"10.0.0.7\"\r\n\r\nOK\r\n");
//!
//! let mut driver = EspDriver::new(link).unwrap();
//! assert_eq!(driver.station_ip().unwrap().to_string(), "10.0.0.7");
//! ```

pub mod config;
pub mod driver;
pub mod error;

pub use config::DriverConfig;
pub use driver::EspDriver;
pub use error::{DriverError, Result};
