//! Catalog of the actions available in a session.
//!
//! The catalog is populated once during session setup and then handed to the
//! dispatcher. Its id and page indexes never change after setup; only the
//! cast state inside each [`ActionDefinition`] mutates.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::action::{ActionDefinition, TriggerKind};
use crate::config::CastConfig;
use crate::error::{ErrorSeverity, SpellError};
use crate::types::ActionId;

/// Registration rejected by the catalog. The first registration always wins.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("action `{id}` is already registered")]
    DuplicateId { id: ActionId },

    #[error("page {page} is already claimed by `{claimed_by}`, rejecting `{rejected}`")]
    DuplicatePage {
        page: u32,
        claimed_by: ActionId,
        rejected: ActionId,
    },

    #[error("no free page left for `{id}` (limit {limit})")]
    Full { id: ActionId, limit: u32 },
}

impl SpellError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "CATALOG_DUPLICATE_ID",
            Self::DuplicatePage { .. } => "CATALOG_DUPLICATE_PAGE",
            Self::Full { .. } => "CATALOG_FULL",
        }
    }
}

/// Owns every [`ActionDefinition`] of a session.
///
/// # Indexes
///
/// ```text
/// ActionCatalog
/// ├── actions: Vec<ActionDefinition>   (registration order)
/// ├── by_id:   ActionId → index
/// └── by_page: page → index            (ordered, for spellbook layout)
/// ```
#[derive(Debug, Default)]
pub struct ActionCatalog {
    actions: Vec<ActionDefinition>,
    by_id: HashMap<ActionId, usize>,
    by_page: BTreeMap<u32, usize>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action`, returning the page it occupies.
    ///
    /// Rejects duplicate ids and pages (logged, never fatal). Actions without
    /// a page get the lowest free one.
    pub fn register(&mut self, mut action: ActionDefinition) -> Result<u32, CatalogError> {
        let result = self.claim(&action);
        match result {
            Ok(page) => {
                action.assign_page(page);
                debug!(
                    target: "spell::catalog",
                    action = %action.id(),
                    page,
                    trigger = %action.trigger().kind,
                    "Registered action"
                );

                let index = self.actions.len();
                self.by_id.insert(action.id().clone(), index);
                self.by_page.insert(page, index);
                self.actions.push(action);
            }
            Err(ref error) => {
                warn!(
                    target: "spell::catalog",
                    code = error.error_code(),
                    %error,
                    "Rejected action registration"
                );
            }
        }
        result
    }

    fn claim(&self, action: &ActionDefinition) -> Result<u32, CatalogError> {
        if self.by_id.contains_key(action.id()) {
            return Err(CatalogError::DuplicateId {
                id: action.id().clone(),
            });
        }

        match action.page() {
            Some(page) => match self.by_page.get(&page) {
                Some(&holder) => Err(CatalogError::DuplicatePage {
                    page,
                    claimed_by: self.actions[holder].id().clone(),
                    rejected: action.id().clone(),
                }),
                None => Ok(page),
            },
            None => self.next_free_page().ok_or_else(|| CatalogError::Full {
                id: action.id().clone(),
                limit: CastConfig::MAX_PAGES,
            }),
        }
    }

    fn next_free_page(&self) -> Option<u32> {
        (0..CastConfig::MAX_PAGES).find(|page| !self.by_page.contains_key(page))
    }

    pub fn get(&self, id: &str) -> Option<&ActionDefinition> {
        self.by_id.get(id).map(|&index| &self.actions[index])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ActionDefinition> {
        self.by_id
            .get(id)
            .copied()
            .map(move |index| &mut self.actions[index])
    }

    pub fn by_page(&self, page: u32) -> Option<&ActionDefinition> {
        self.by_page.get(&page).map(|&index| &self.actions[index])
    }

    /// All actions bound to `kind`, in page order.
    ///
    /// Picking one of several (for example by the page the player has open)
    /// is up to the caller.
    pub fn by_trigger(&self, kind: TriggerKind) -> Vec<&ActionDefinition> {
        self.in_page_order()
            .filter(|action| action.trigger().kind == kind)
            .collect()
    }

    /// All actions bound to the trigger `code`, in page order.
    pub fn by_trigger_code(&self, code: &str) -> Vec<&ActionDefinition> {
        self.in_page_order()
            .filter(|action| action.trigger().code == code)
            .collect()
    }

    fn in_page_order(&self) -> impl Iterator<Item = &ActionDefinition> + '_ {
        self.by_page.values().map(|&index| &self.actions[index])
    }

    /// Highest assigned page + 1, or 0 for an empty catalog.
    pub fn total_slots(&self) -> u32 {
        self.by_page
            .keys()
            .next_back()
            .map_or(0, |&highest| highest + 1)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> + '_ {
        self.actions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActionDefinition> + '_ {
        self.actions.iter_mut()
    }
}
