//! Cast replication between peers.
//!
//! - `message`: the wire format exchanged with peers
//! - `bridge`: encoding of local casts and replay of inbound ones
//! - `error`: why an inbound message was dropped

mod bridge;
mod error;
mod message;

pub use bridge::ReplicationBridge;
pub use error::ReplicationError;
pub use message::ReplicationMessage;
