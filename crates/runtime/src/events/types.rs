//! Event types for different topics.

use spell_core::{ActionId, ActorId, CastSummary, Timestamp};

use crate::replication::ReplicationMessage;

/// Events emitted by the cast state machines.
#[derive(Debug, Clone, PartialEq)]
pub enum CastEvent {
    /// A cast went active (local press or remote replay).
    Started {
        action_id: ActionId,
        actor: ActorId,
        at: Timestamp,
    },

    /// A cast was released by its owner.
    Released { summary: CastSummary },

    /// A local channel hit its maximum duration and released itself.
    TimedOut { summary: CastSummary },

    /// A cast was force-released when the session was torn down.
    Disposed { summary: CastSummary },

    /// A local press or release did nothing.
    Rejected {
        action_id: ActionId,
        code: &'static str,
    },
}

/// Events about traffic with peers.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    /// A local cast edge was handed to the transport.
    Sent { message: ReplicationMessage },

    /// An inbound message was replayed.
    Received {
        action_id: ActionId,
        sender: ActorId,
    },

    /// An inbound message was dropped.
    Dropped {
        sender: ActorId,
        code: &'static str,
        reason: String,
    },
}
