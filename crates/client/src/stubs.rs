//! Headless stand-ins for the renderer, effect system, combat and physics.
//!
//! They log what a real engine would be asked to do, which makes a stdio node
//! useful for replaying traffic and for watching deferred work complete.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use spell_core::{
    CAMERA, COMBAT, CameraPose, CameraRig, DamageSink, EFFECTS, EffectHandle, EffectParams,
    EffectSpawner, PHYSICS, PhysicsProvider, ServiceLocator, Vec3,
};
use tracing::info;

/// Eye-height camera at the origin, looking down -Z.
pub struct FixedCamera;

impl CameraRig for FixedCamera {
    fn query_camera_pose(&self) -> CameraPose {
        CameraPose {
            position: Vec3::new(0.0, 1.7, 0.0),
            direction: Vec3::FORWARD,
        }
    }
}

#[derive(Default)]
pub struct LoggingEffects {
    next: AtomicU64,
}

impl EffectSpawner for LoggingEffects {
    fn spawn_effect(&self, kind: &str, params: &EffectParams) -> EffectHandle {
        let handle = EffectHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        info!(
            target: "spellcast::effects",
            handle = handle.0,
            kind,
            origin = ?params.origin,
            target_id = ?params.target_id,
            values = ?params.values,
            "Spawn effect"
        );
        handle
    }

    fn retire_effect(&self, handle: EffectHandle) {
        info!(target: "spellcast::effects", handle = handle.0, "Retire effect");
    }
}

pub struct LoggingCombat;

impl DamageSink for LoggingCombat {
    fn apply_damage(&self, target_id: &str, amount: f64) {
        info!(target: "spellcast::combat", target_id, amount, "Damage");
    }
}

pub struct LoggingPhysics;

impl PhysicsProvider for LoggingPhysics {
    fn apply_impulse(&self, target_id: &str, vector: Vec3) {
        info!(target: "spellcast::physics", target_id, ?vector, "Impulse");
    }
}

/// Provides every stub. Physics comes online after `physics_delay`, the way a
/// real engine finishes initializing after the session has started.
pub fn install(locator: &Arc<ServiceLocator>, physics_delay: Duration) {
    locator.provide(CAMERA, Arc::new(FixedCamera) as Arc<dyn CameraRig>);
    locator.provide(
        EFFECTS,
        Arc::new(LoggingEffects::default()) as Arc<dyn EffectSpawner>,
    );
    locator.provide(COMBAT, Arc::new(LoggingCombat) as Arc<dyn DamageSink>);

    if physics_delay.is_zero() {
        provide_physics(locator);
        return;
    }

    let locator = Arc::clone(locator);
    tokio::spawn(async move {
        tokio::time::sleep(physics_delay).await;
        provide_physics(&locator);
    });
}

fn provide_physics(locator: &ServiceLocator) {
    locator.provide(PHYSICS, Arc::new(LoggingPhysics) as Arc<dyn PhysicsProvider>);
    info!(target: "spellcast::physics", "Physics ready");
}
