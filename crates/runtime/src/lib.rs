//! Session runtime for realtime spellcasting.
//!
//! This crate wires the casting core into a running session: it resolves
//! decoded input to actions, replicates local casts to peers, replays theirs,
//! and drives channel timeouts. Consumers embed a [`CastSession`] and forward
//! the [`ReplicationMessage`]s it returns to their transport.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the dispatcher and its builder
//! - [`replication`] defines the wire message and the encode/replay bridge
//! - [`events`] provides a topic-based event bus for presentation layers
//! - [`config`] holds runtime and replication settings
pub mod config;
pub mod error;
pub mod events;
pub mod replication;
pub mod session;

pub use config::{ReplicationConfig, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use events::{CastEvent, Event, EventBus, ReplicationEvent, Topic};
pub use replication::{ReplicationBridge, ReplicationError, ReplicationMessage};
pub use session::{CastSession, ChannelSample, InputEvent, SessionBuilder};
