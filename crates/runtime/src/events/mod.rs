//! Topic-based event bus for cast session events.
//!
//! Presentation layers (HUD, audio cues, network stats) subscribe only to the
//! topics they need. Publishing never blocks the cast path.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CastEvent, ReplicationEvent};
