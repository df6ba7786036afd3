//! Common test utilities for driver integration tests.

#![allow(dead_code)]

use espat_driver::{DriverConfig, EspDriver};
use espat_hardware::mock::MockTransport;
use espat_protocol::SessionConfig;

/// Reply to `AT+GMR` from a module running 1.x firmware.
pub const GMR_REPLY: &str = "AT version:1.2.0.0(Jul  1 2016 20:04:45)\r\n\
                             SDK version:1.5.4.1(39cb9a32)\r\n\
                             compile time:Dec  7 2016 12:00:00\r\n\
                             \r\nOK\r\n";

/// Driver whose link answers each `(trigger, reply)` pair once, in order.
pub fn driver(replies: &[(&str, &str)]) -> EspDriver<MockTransport> {
    driver_with(DriverConfig::default(), replies)
}

/// Like [`driver`] with custom driver settings.
pub fn driver_with(config: DriverConfig, replies: &[(&str, &str)]) -> EspDriver<MockTransport> {
    let mut link = MockTransport::new();
    for (trigger, reply) in replies {
        link.reply_to(trigger, reply);
    }
    EspDriver::with_config(link, SessionConfig::default(), config).expect("valid config")
}

/// Replies for a module that answers every step of `init` with `OK`.
pub fn healthy_init() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ATE0", "ATE0\r\n\r\nOK\r\n"),
        ("AT\r\n", "\r\nOK\r\n"),
        ("ATE0", "\r\nOK\r\n"),
        ("AT+CWMODE=1", "\r\nOK\r\n"),
        ("AT+CIPMUX=1", "\r\nOK\r\n"),
        ("AT+CIPDINFO=1", "\r\nOK\r\n"),
        ("AT+CWAUTOCONN=0", "\r\nOK\r\n"),
        ("AT+CWDHCP=1,1", "\r\nOK\r\n"),
        ("AT+GMR", GMR_REPLY),
    ]
}

/// Everything the driver wrote, as text.
pub fn written(driver: &EspDriver<MockTransport>) -> String {
    driver.session().transport().written_str()
}
