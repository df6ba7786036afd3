//! Common test utilities for integration tests.
//!
//! Helpers here build sessions over a [`MockTransport`] with scripted
//! replies, so each test starts from fresh, isolated state.

#![allow(dead_code)]

use espat_hardware::mock::MockTransport;
use espat_protocol::{AtSession, SessionConfig};

/// Session whose link answers each `(trigger, reply)` pair once, in order.
pub fn scripted(replies: &[(&str, &str)]) -> AtSession<MockTransport> {
    scripted_with(SessionConfig::default(), replies)
}

/// Like [`scripted`] with a custom configuration.
pub fn scripted_with(config: SessionConfig, replies: &[(&str, &str)]) -> AtSession<MockTransport> {
    let mut link = MockTransport::new();
    for (trigger, reply) in replies {
        link.reply_to(trigger, reply);
    }
    AtSession::with_config(link, config).expect("valid session config")
}

/// Session whose link already holds `rx`.
pub fn with_pending(rx: impl AsRef<[u8]>) -> AtSession<MockTransport> {
    let mut link = MockTransport::new();
    link.push_rx(rx);
    AtSession::new(link).expect("valid session config")
}

/// Everything the session wrote, as text.
pub fn written(session: &AtSession<MockTransport>) -> String {
    session.transport().written_str()
}
