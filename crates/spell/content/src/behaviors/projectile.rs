use spell_core::{ActionBehavior, CastContext, CastSummary, ChannelSession, DeferredQueue};

use super::{effect_params, retire, spawn_detached, spawn_tracked, strike};

/// Charged shot: an optional charge visual while held, then the projectile
/// on release.
///
/// Channel fields `damage` and `velocity` override the base values when the
/// spell declares those curves.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub effect: String,
    pub charge_effect: Option<String>,
    pub damage: f64,
    pub impulse: f64,
}

impl ActionBehavior for Projectile {
    fn on_start(
        &self,
        cast: &CastContext,
        session: Option<&mut ChannelSession>,
        services: &DeferredQueue,
    ) {
        if let (Some(kind), Some(session)) = (&self.charge_effect, session) {
            session.effect = spawn_tracked(services, kind, &effect_params(cast, None));
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
        spawn_detached(services, &self.effect, effect_params(cast, Some(summary)));

        let damage = summary.derived("damage").unwrap_or(self.damage);
        let impulse = summary.derived("velocity").unwrap_or(self.impulse);
        strike(services, cast, damage, impulse);
    }
}
