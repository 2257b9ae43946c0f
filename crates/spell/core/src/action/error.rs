//! Action errors.
//!
//! [`DefinitionError`] rejects malformed setup data before it reaches the
//! catalog. [`CastRejection`] explains why a press did nothing; it is
//! benign and never surfaced to the player.

use crate::error::{ErrorSeverity, SpellError};

/// Invalid action definition detected at build time.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("action id must not be empty")]
    EmptyId,

    #[error("cooldown must be a finite, non-negative number of seconds (got {0})")]
    InvalidCooldown(f64),

    #[error("channel duration must be finite and positive (got {0})")]
    InvalidChannelDuration(f64),

    #[error("channel curve `{field}` must be finite with max >= min")]
    DecreasingCurve { field: String },

    #[error("channel curve `{field}` declared twice")]
    DuplicateCurve { field: String },

    #[error("channel declares {count} curves, limit is {limit}")]
    TooManyCurves { count: usize, limit: usize },

    #[error("page {page} exceeds the highest page {limit}")]
    PageOutOfRange { page: u32, limit: u32 },
}

impl SpellError for DefinitionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyId => "DEFINITION_EMPTY_ID",
            Self::InvalidCooldown(_) => "DEFINITION_INVALID_COOLDOWN",
            Self::InvalidChannelDuration(_) => "DEFINITION_INVALID_CHANNEL_DURATION",
            Self::DecreasingCurve { .. } => "DEFINITION_DECREASING_CURVE",
            Self::DuplicateCurve { .. } => "DEFINITION_DUPLICATE_CURVE",
            Self::TooManyCurves { .. } => "DEFINITION_TOO_MANY_CURVES",
            Self::PageOutOfRange { .. } => "DEFINITION_PAGE_OUT_OF_RANGE",
        }
    }
}

/// Reason a cast transition was a no-op.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CastRejection {
    /// Local cast_down while the cooldown is still running.
    #[error("action is cooling down ({remaining:.2}s remaining)")]
    OnCooldown { remaining: f64 },

    /// Local cast_down while the key is still held from a previous press.
    #[error("action is already active")]
    AlreadyActive,

    /// Local cast_up with no matching cast_down.
    #[error("action is not active")]
    NotActive,
}

impl SpellError for CastRejection {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Benign
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OnCooldown { .. } => "CAST_ON_COOLDOWN",
            Self::AlreadyActive => "CAST_ALREADY_ACTIVE",
            Self::NotActive => "CAST_NOT_ACTIVE",
        }
    }
}
