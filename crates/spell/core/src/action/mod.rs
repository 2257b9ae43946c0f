//! Action domain - definitions and the cast lifecycle.
//!
//! # Module Structure
//!
//! - `trigger`: how an action is bound to input (shape gesture or held key)
//! - `channel`: hold-to-charge parameters, easing curves, channel sessions
//! - `context`: per-invocation cast context and release summaries
//! - `behavior`: start/stop hooks that reach collaborators via services
//! - `definition`: [`ActionDefinition`] and its Idle/Active state machine
//! - `error`: definition validation errors and cast rejections

pub mod behavior;
pub mod channel;
pub mod context;
pub mod definition;
pub mod error;
pub mod trigger;

pub use behavior::{ActionBehavior, NoopBehavior};
pub use channel::{ChannelCurve, ChannelPayload, ChannelSession, ChannelSpec, Easing};
pub use context::{CastContext, CastSummary, ReleaseFlags};
pub use definition::{ActionDefinition, ActionDefinitionBuilder, RemoteReplay};
pub use error::{CastRejection, DefinitionError};
pub use trigger::{Trigger, TriggerKind};
