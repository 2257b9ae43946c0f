//! Data-driven spell behaviors.
//!
//! Each [`BehaviorSpec`] variant maps onto one [`ActionBehavior`]
//! implementation that talks to collaborators through the service locator.
//! Visual effects run for every cast, local or replayed. Damage and impulses
//! are applied only by the peer that cast the spell, so a replay never hits
//! the same target twice.

mod beam;
mod burst;
mod projectile;
mod shield;

use std::sync::Arc;

use spell_core::{
    ActionBehavior, COMBAT, CastContext, CastSummary, ChannelSession, DeferredQueue, EFFECTS,
    EffectHandle, EffectParams, NoopBehavior, PHYSICS,
};
use tracing::trace;

pub use beam::Beam;
pub use burst::Burst;
pub use projectile::Projectile;
pub use shield::Shield;

/// Behavior declared by a spellbook entry.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorSpec {
    /// Charged shot released on cast_up.
    Projectile {
        effect: String,
        #[cfg_attr(feature = "serde", serde(default))]
        charge_effect: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        damage: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        impulse: f64,
    },
    /// Continuous effect alive while the key is held.
    Beam {
        effect: String,
        #[cfg_attr(feature = "serde", serde(default))]
        damage: f64,
    },
    /// Instant area effect on cast_down.
    Burst {
        effect: String,
        #[cfg_attr(feature = "serde", serde(default))]
        damage: f64,
    },
    /// Protective effect held up until release.
    Shield { effect: String },
    #[default]
    None,
}

impl BehaviorSpec {
    pub fn into_behavior(self) -> Arc<dyn ActionBehavior> {
        match self {
            Self::Projectile {
                effect,
                charge_effect,
                damage,
                impulse,
            } => Arc::new(Projectile {
                effect,
                charge_effect,
                damage,
                impulse,
            }),
            Self::Beam { effect, damage } => Arc::new(Beam { effect, damage }),
            Self::Burst { effect, damage } => Arc::new(Burst { effect, damage }),
            Self::Shield { effect } => Arc::new(Shield { effect }),
            Self::None => Arc::new(NoopBehavior),
        }
    }
}

/// Effect parameters from the cast context plus the channel outcome, if any.
fn effect_params(cast: &CastContext, summary: Option<&CastSummary>) -> EffectParams {
    EffectParams {
        origin: cast.origin,
        direction: cast.direction,
        target_id: cast.target_id.clone(),
        values: summary
            .and_then(|summary| summary.channel.as_ref())
            .map(|payload| payload.derived.clone())
            .unwrap_or_default(),
    }
}

/// Spawns an effect whose handle must be kept in the channel session.
///
/// Handles cannot be recorded for deferred spawns, so a spawner that is not
/// up yet simply means no visual for this cast.
fn spawn_tracked(
    services: &DeferredQueue,
    kind: &str,
    params: &EffectParams,
) -> Option<EffectHandle> {
    match services.locator().request(EFFECTS) {
        Some(effects) => Some(effects.spawn_effect(kind, params)),
        None => {
            trace!(target: "spell::cast", effect = kind, "No effect spawner yet, skipping visual");
            None
        }
    }
}

/// Spawns a fire-and-forget effect, deferred until the spawner exists.
fn spawn_detached(services: &DeferredQueue, kind: &str, params: EffectParams) {
    let kind = kind.to_owned();
    services.enqueue_until_ready(EFFECTS, move |effects| {
        effects.spawn_effect(&kind, &params);
    });
}

fn retire(services: &DeferredQueue, session: Option<&ChannelSession>) {
    let Some(handle) = session.and_then(|session| session.effect) else {
        return;
    };
    services.enqueue_until_ready(EFFECTS, move |effects| effects.retire_effect(handle));
}

/// Applies damage and an impulse along the aim direction to the cast's
/// target. Replays are skipped.
fn strike(services: &DeferredQueue, cast: &CastContext, damage: f64, impulse: f64) {
    if cast.is_remote {
        return;
    }
    let Some(target) = cast.target_id.clone() else {
        return;
    };

    if damage > 0.0 {
        let target = target.clone();
        services.enqueue_until_ready(COMBAT, move |combat| combat.apply_damage(&target, damage));
    }

    if impulse > 0.0
        && let Some(direction) = cast.direction.and_then(|d| d.normalized())
    {
        let vector = direction.scale(impulse);
        services.enqueue_until_ready(PHYSICS, move |physics| {
            physics.apply_impulse(&target, vector);
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use spell_core::{
        COMBAT, DamageSink, DeferredQueue, EFFECTS, EffectHandle, EffectParams, EffectSpawner,
        PHYSICS, PhysicsProvider, ServiceLocator, Vec3,
    };

    /// Collaborator stand-in that records every call.
    #[derive(Default)]
    pub struct World {
        pub calls: Mutex<Vec<String>>,
        next: Mutex<u64>,
    }

    impl World {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl EffectSpawner for World {
        fn spawn_effect(&self, kind: &str, params: &EffectParams) -> EffectHandle {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            self.record(format!("spawn {kind} {:?}", params.values.get("damage")));
            EffectHandle(*next)
        }

        fn retire_effect(&self, handle: EffectHandle) {
            self.record(format!("retire {}", handle.0));
        }
    }

    impl DamageSink for World {
        fn apply_damage(&self, target_id: &str, amount: f64) {
            self.record(format!("damage {target_id} {amount}"));
        }
    }

    impl PhysicsProvider for World {
        fn apply_impulse(&self, target_id: &str, vector: Vec3) {
            self.record(format!("impulse {target_id} {}", vector.length()));
        }
    }

    pub fn world() -> (Arc<World>, DeferredQueue) {
        let world = Arc::new(World::default());
        let locator = ServiceLocator::shared();
        locator.provide(EFFECTS, Arc::clone(&world) as Arc<dyn EffectSpawner>);
        locator.provide(COMBAT, Arc::clone(&world) as Arc<dyn DamageSink>);
        locator.provide(PHYSICS, Arc::clone(&world) as Arc<dyn PhysicsProvider>);
        (world, DeferredQueue::new(locator))
    }
}
