//! Mock transport for testing and development.
//!
//! This module provides a simulated serial link that can be scripted
//! programmatically without requiring an ESP8266 module.

pub mod transport;

pub use transport::MockTransport;
