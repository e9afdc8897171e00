//! Per-call bridging between the telephony socket and the EVI socket.

mod session;

pub use session::{BridgeSession, StreamInfo};
