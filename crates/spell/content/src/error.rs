//! Content errors.

use spell_core::{DefinitionError, ErrorSeverity, SpellError};

/// A spellbook entry that could not be turned into an action.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ContentError {
    #[error("spell `{id}` is invalid: {source}")]
    InvalidSpell {
        id: String,
        #[source]
        source: DefinitionError,
    },
}

impl SpellError for ContentError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSpell { .. } => "CONTENT_INVALID_SPELL",
        }
    }
}
