//! Interfaces of the external subsystems the casting core talks to.
//!
//! Implementations live outside this crate (renderer, physics engine, effect
//! system). Behaviors reach them only through the [`ServiceLocator`] keys
//! below, never by holding a direct reference.
//!
//! [`ServiceLocator`]: super::ServiceLocator

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ServiceKey;
use crate::types::{EffectHandle, Vec3};

/// Camera position and view direction at the moment of a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub direction: Vec3,
}

/// Source of the local viewpoint used to aim local casts.
pub trait CameraRig: Send + Sync {
    fn query_camera_pose(&self) -> CameraPose;

    /// Id of whatever the view ray currently rests on, if anything.
    fn query_target(&self) -> Option<String> {
        None
    }
}

/// Physics engine surface used by spells that push things around.
pub trait PhysicsProvider: Send + Sync {
    fn apply_impulse(&self, target_id: &str, vector: Vec3);
}

/// Spawns and retires visual effects.
pub trait EffectSpawner: Send + Sync {
    fn spawn_effect(&self, kind: &str, params: &EffectParams) -> EffectHandle;

    /// Retires an effect created earlier. Spawners that let effects expire on
    /// their own can ignore this.
    fn retire_effect(&self, _handle: EffectHandle) {}
}

/// Health/combat system surface.
pub trait DamageSink: Send + Sync {
    fn apply_damage(&self, target_id: &str, amount: f64);
}

/// Parameters handed to [`EffectSpawner::spawn_effect`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectParams {
    pub origin: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub target_id: Option<String>,
    /// Continuous parameters such as size or velocity, by field name.
    pub values: BTreeMap<String, f64>,
}

pub const CAMERA: ServiceKey<Arc<dyn CameraRig>> = ServiceKey::new("camera");
/// `request(PHYSICS)` is the `queryPhysicsProvider` lookup: `None` until the
/// physics engine has finished initializing.
pub const PHYSICS: ServiceKey<Arc<dyn PhysicsProvider>> = ServiceKey::new("physics");
pub const EFFECTS: ServiceKey<Arc<dyn EffectSpawner>> = ServiceKey::new("effects");
pub const COMBAT: ServiceKey<Arc<dyn DamageSink>> = ServiceKey::new("combat");
