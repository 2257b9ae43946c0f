//! Data-driven spell content.
//!
//! This crate provides the spellbook format and its loader, plus the
//! behaviors a spellbook entry can declare:
//! - Spell definitions (data-driven via RON)
//! - Projectile, beam, burst and shield behaviors
//!
//! Loaders produce a populated [`spell_core::ActionCatalog`] ready to be
//! handed to a cast session.

pub mod behaviors;
pub mod error;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use behaviors::{Beam, BehaviorSpec, Burst, Projectile, Shield};
pub use error::ContentError;

#[cfg(feature = "loaders")]
pub use loaders::{ChannelDef, LoadResult, SpellSpec, Spellbook, SpellbookLoader};
