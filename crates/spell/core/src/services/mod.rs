//! Late-bound collaborator lookup.
//!
//! The casting core never holds direct references to rendering, physics, or
//! effect subsystems. Instead each collaborator is published under a typed
//! [`ServiceKey`] in the [`ServiceLocator`], and work that needs a
//! collaborator which is not up yet goes through the [`DeferredQueue`].
//!
//! # Contract
//!
//! - `request` is a pure, synchronous query
//! - `on_ready` fires exactly once: immediately if the service is already
//!   provided, otherwise on the first `provide`
//! - `provide` never re-fires waiters that were already satisfied

mod collaborators;
mod deferred;
mod error;
mod locator;

pub use collaborators::{
    CAMERA, COMBAT, CameraPose, CameraRig, DamageSink, EFFECTS, EffectParams, EffectSpawner,
    PHYSICS, PhysicsProvider,
};
pub use deferred::{DeferredQueue, DeferredStatus};
pub use error::ServiceError;
pub use locator::{ServiceKey, ServiceLocator};
