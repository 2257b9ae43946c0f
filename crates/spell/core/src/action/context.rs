//! Per-invocation cast data.

use bitflags::bitflags;

use super::channel::ChannelPayload;
use crate::types::{ActionId, ActorId, Vec3};

/// Everything a single cast_down/cast_up needs to know about who cast and
/// where.
///
/// Local contexts are built from the camera pose at the time of the event.
/// Remote contexts carry the origin, direction, target, and payload verbatim
/// from the replication message and are never recomputed locally.
#[derive(Clone, Debug, PartialEq)]
pub struct CastContext {
    pub actor: ActorId,
    pub origin: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub target_id: Option<String>,
    pub is_remote: bool,
    /// Channel outcome computed by the originating peer (remote cast_up only).
    pub payload: Option<ChannelPayload>,
}

impl CastContext {
    /// Context for the local player with no aim information yet.
    pub fn local() -> Self {
        Self {
            actor: ActorId::LOCAL,
            origin: None,
            direction: None,
            target_id: None,
            is_remote: false,
            payload: None,
        }
    }

    /// Context for a cast replayed on behalf of `actor`.
    pub fn remote(actor: ActorId) -> Self {
        Self {
            actor,
            is_remote: true,
            ..Self::local()
        }
    }

    #[must_use]
    pub fn with_aim(mut self, origin: Vec3, direction: Vec3) -> Self {
        self.origin = Some(origin);
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: ChannelPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

bitflags! {
    /// How a cast ended.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ReleaseFlags: u8 {
        /// Replayed on behalf of a peer.
        const REMOTE = 1 << 0;
        /// Carries a channel payload.
        const CHANNELED = 1 << 1;
        /// Released automatically when the channel reached its maximum.
        const TIMED_OUT = 1 << 2;
        /// Released by a forced dispose; never replicated.
        const DISPOSED = 1 << 3;
    }
}

/// Result of releasing an active cast.
#[derive(Clone, Debug, PartialEq)]
pub struct CastSummary {
    pub action_id: ActionId,
    pub actor: ActorId,
    /// Locally observed hold time, when a channel session was open.
    pub held_seconds: Option<f64>,
    /// Channel outcome: computed here for local casts, copied from the
    /// message for remote ones.
    pub channel: Option<ChannelPayload>,
    pub flags: ReleaseFlags,
}

impl CastSummary {
    pub fn progress(&self) -> Option<f64> {
        self.channel.as_ref().map(|payload| payload.progress)
    }

    pub fn derived(&self, field: &str) -> Option<f64> {
        self.channel.as_ref().and_then(|payload| payload.value(field))
    }

    /// True if this release should be sent to peers.
    pub fn is_replicable(&self) -> bool {
        !self
            .flags
            .intersects(ReleaseFlags::REMOTE | ReleaseFlags::DISPOSED)
    }
}
