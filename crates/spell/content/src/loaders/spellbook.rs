//! Spellbook loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::{ActionCatalog, ActionDefinition, ChannelCurve, SpellError, Trigger};
use tracing::{info, warn};

use crate::behaviors::BehaviorSpec;
use crate::error::ContentError;
use crate::loaders::{LoadResult, read_file};

/// Spellbook structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spellbook {
    pub spells: Vec<SpellSpec>,
}

/// One spell as declared in the spellbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellSpec {
    pub id: String,
    pub trigger: Trigger,
    /// Omit to take the next free page.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub cooldown: f64,
    #[serde(default)]
    pub channel: Option<ChannelDef>,
    #[serde(default)]
    pub behavior: BehaviorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    pub max_seconds: f64,
    #[serde(default)]
    pub curves: Vec<ChannelCurve>,
}

impl SpellSpec {
    pub fn into_definition(self) -> Result<ActionDefinition, ContentError> {
        let id = self.id.clone();
        let mut builder = ActionDefinition::builder(self.id, self.trigger)
            .cooldown(self.cooldown)
            .shared_behavior(self.behavior.into_behavior());

        if let Some(page) = self.page {
            builder = builder.page(page);
        }
        if let Some(channel) = self.channel {
            builder = builder.channel(channel.max_seconds, channel.curves);
        }

        builder
            .build()
            .map_err(|source| ContentError::InvalidSpell { id, source })
    }
}

/// Loader for spellbooks from RON files.
pub struct SpellbookLoader;

impl SpellbookLoader {
    /// Load a spellbook file and build its catalog.
    pub fn load(path: &Path) -> LoadResult<ActionCatalog> {
        let content = read_file(path)?;
        let book = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load spellbook {}: {}", path.display(), e))?;
        Ok(Self::build_catalog(book))
    }

    /// Build the catalog from the spellbook compiled into this crate.
    pub fn load_embedded() -> LoadResult<ActionCatalog> {
        let book = Self::parse(include_str!("../../data/spellbook.ron"))?;
        Ok(Self::build_catalog(book))
    }

    pub fn parse(content: &str) -> LoadResult<Spellbook> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse spellbook RON: {}", e))
    }

    /// Registers every valid spell. Invalid entries and duplicates are
    /// logged and skipped; the first spell to claim an id or page keeps it.
    pub fn build_catalog(book: Spellbook) -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        let declared = book.spells.len();

        for spell in book.spells {
            match spell.into_definition() {
                // Rejections are logged by the catalog.
                Ok(definition) => {
                    let _ = catalog.register(definition);
                }
                Err(error) => {
                    warn!(
                        target: "spell::catalog",
                        code = error.error_code(),
                        %error,
                        "Skipping spell"
                    );
                }
            }
        }

        info!(
            target: "spell::catalog",
            declared,
            registered = catalog.len(),
            slots = catalog.total_slots(),
            "Spellbook loaded"
        );
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spell_core::TriggerKind;

    #[test]
    fn embedded_spellbook_loads() {
        let catalog = SpellbookLoader::load_embedded().expect("embedded spellbook");

        assert_eq!(catalog.len(), 5);
        let zoltraak = catalog.get("zoltraak").unwrap();
        assert_eq!(zoltraak.trigger().kind, TriggerKind::HoldKey);
        assert_eq!(zoltraak.channel_max_seconds(), Some(3.0));

        // `barrier` declares no page and takes the first gap.
        assert_eq!(catalog.get("barrier").unwrap().page(), Some(3));
        assert_eq!(catalog.by_trigger_code("circle").len(), 2);
    }

    #[test]
    fn invalid_spells_are_skipped() {
        let book = SpellbookLoader::parse(
            r#"(spells: [
                (id: "ok", trigger: (kind: shape, code: "line")),
                (id: "broken", trigger: (kind: shape, code: "line"), cooldown: -1.0),
                (
                    id: "inverted",
                    trigger: (kind: hold_key, code: "KeyQ"),
                    channel: Some((
                        max_seconds: 1.0,
                        curves: [(field: "size", min: 2.0, max: 1.0)],
                    )),
                ),
            ])"#,
        )
        .unwrap();

        let catalog = SpellbookLoader::build_catalog(book);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("ok").is_some());
    }

    #[test]
    fn into_definition_reports_the_spell_id() {
        let spec = SpellSpec {
            id: "bad".into(),
            trigger: Trigger::shape("x"),
            page: None,
            cooldown: f64::NAN,
            channel: None,
            behavior: BehaviorSpec::None,
        };

        let err = spec.into_definition().unwrap_err();
        assert!(matches!(err, ContentError::InvalidSpell { ref id, .. } if id == "bad"));
    }
}
