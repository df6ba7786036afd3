pub mod builder;
pub mod config;
pub mod extract;
pub mod inbound;
pub mod listing;
pub mod ring_buffer;
pub mod session;

pub use builder::AtCommand;
pub use config::SessionConfig;
pub use extract::{ExtractOutcome, ExtractPhase};
pub use inbound::{FrameHeader, InboundData, InboundOutcome};
pub use listing::ClientTable;
pub use ring_buffer::RingBuffer;
pub use session::AtSession;
