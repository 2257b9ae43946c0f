//! Start/stop hooks attached to an action.

use super::channel::ChannelSession;
use super::context::{CastContext, CastSummary};
use crate::services::DeferredQueue;

/// What an action does when it starts and when it is released.
///
/// Hooks receive the explicit [`ChannelSession`] record instead of capturing
/// mutable state, so re-entrant casts cannot leak state into each other.
/// Collaborators (effects, physics, combat) are reached only through
/// `services`; work that needs a collaborator which is not up yet should go
/// through [`DeferredQueue::enqueue_until_ready`] rather than fail.
pub trait ActionBehavior: Send + Sync {
    /// Called on every successful cast_down, local or remote.
    ///
    /// `session` is present for channel-capable actions; the hook may record
    /// the effect handle it spawned there.
    fn on_start(
        &self,
        cast: &CastContext,
        session: Option<&mut ChannelSession>,
        services: &DeferredQueue,
    );

    /// Called once per release (cast_up, timeout, dispose, or a peer session
    /// replaced by a newer press) with the closed session, if any.
    fn on_stop(
        &self,
        cast: &CastContext,
        summary: &CastSummary,
        session: Option<&ChannelSession>,
        services: &DeferredQueue,
    );
}

/// Behavior that does nothing, for actions driven purely by their summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBehavior;

impl ActionBehavior for NoopBehavior {
    fn on_start(&self, _: &CastContext, _: Option<&mut ChannelSession>, _: &DeferredQueue) {}

    fn on_stop(
        &self,
        _: &CastContext,
        _: &CastSummary,
        _: Option<&ChannelSession>,
        _: &DeferredQueue,
    ) {
    }
}
