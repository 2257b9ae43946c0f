use spell_core::{ActionBehavior, CastContext, CastSummary, ChannelSession, DeferredQueue};

use super::{effect_params, spawn_detached, strike};

/// Instant effect at the caster's aim point. Nothing happens on release.
#[derive(Clone, Debug, PartialEq)]
pub struct Burst {
    pub effect: String,
    pub damage: f64,
}

impl ActionBehavior for Burst {
    fn on_start(
        &self,
        cast: &CastContext,
        _: Option<&mut ChannelSession>,
        services: &DeferredQueue,
    ) {
        spawn_detached(services, &self.effect, effect_params(cast, None));
        strike(services, cast, self.damage, 0.0);
    }

    fn on_stop(
        &self,
        _: &CastContext,
        _: &CastSummary,
        _: Option<&ChannelSession>,
        _: &DeferredQueue,
    ) {
    }
}
