//! Action dispatch core for realtime spellcasting sessions.
//!
//! `spell-core` defines the cast state machine, the action catalog, and the
//! service locator that keeps casting logic decoupled from rendering, physics,
//! and audio. Everything here is synchronous: transitions run to completion
//! inside the handler that receives an input or network event.
//!
//! Modules are organized by dependency order:
//! - [`services`] hosts the [`ServiceLocator`] and [`DeferredQueue`]
//! - [`action`] defines [`ActionDefinition`] and its cast lifecycle
//! - [`catalog`] indexes definitions by id, page, and trigger
pub mod action;
pub mod catalog;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use action::{
    ActionBehavior, ActionDefinition, ActionDefinitionBuilder, CastContext, CastRejection,
    CastSummary, ChannelCurve, ChannelPayload, ChannelSession, ChannelSpec, DefinitionError,
    Easing, NoopBehavior, ReleaseFlags, RemoteReplay, Trigger, TriggerKind,
};
pub use catalog::{ActionCatalog, CatalogError};
pub use config::CastConfig;
pub use error::{ErrorSeverity, SpellError};
pub use services::{
    CAMERA, COMBAT, CameraPose, CameraRig, DamageSink, DeferredQueue, DeferredStatus, EFFECTS,
    EffectParams, EffectSpawner, PHYSICS, PhysicsProvider, ServiceError, ServiceKey,
    ServiceLocator,
};
pub use types::{ActionId, ActorId, EffectHandle, Phase, Timestamp, Vec3};
