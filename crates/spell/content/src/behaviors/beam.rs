use spell_core::{ActionBehavior, CastContext, CastSummary, ChannelSession, DeferredQueue};

use super::{effect_params, retire, spawn_tracked, strike};

/// Beam kept alive for the duration of the hold; damage lands on release.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    pub effect: String,
    pub damage: f64,
}

impl ActionBehavior for Beam {
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
        cast: &CastContext,
        summary: &CastSummary,
        session: Option<&ChannelSession>,
        services: &DeferredQueue,
    ) {
        retire(services, session);
        let damage = summary.derived("damage").unwrap_or(self.damage);
        strike(services, cast, damage, 0.0);
    }
}
