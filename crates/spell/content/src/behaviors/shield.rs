use spell_core::{ActionBehavior, CastContext, CastSummary, ChannelSession, DeferredQueue};

use super::{effect_params, retire, spawn_tracked};

/// Protective effect raised on press and dropped on release.
#[derive(Clone, Debug, PartialEq)]
pub struct Shield {
    pub effect: String,
}

impl ActionBehavior for Shield {
    fn on_start(
        &self,
        cast: &CastContext,
        session: Option<&mut ChannelSession>,
        services: &DeferredQueue,
    ) {
        let handle = spawn_tracked(services, &self.effect, &effect_params(cast, None));
        if let Some(session) = session {
            session.effect = handle;
        }
    }

    fn on_stop(
        &self,
        _: &CastContext,
        _: &CastSummary,
        session: Option<&ChannelSession>,
        services: &DeferredQueue,
    ) {
        retire(services, session);
    }
}
