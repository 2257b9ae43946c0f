//! Common error infrastructure for spell-core.
//!
//! Domain-specific errors (`CatalogError`, `ServiceError`, `CastRejection`)
//! live next to the code that detects them. None of them is fatal to a
//! session: every error is resolved where it is detected and the worst
//! visible outcome is that a press did nothing.

/// Severity level of an error, used for log levels and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Expected during normal play (cooldown, key not held).
    Benign,

    /// Temporary condition that resolves itself (service not provided yet).
    Recoverable,

    /// Bad input from setup data or a peer; rejected, never retried.
    Validation,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
        }
    }

    /// Returns true if the error should be surfaced at warn level.
    pub const fn is_noteworthy(&self) -> bool {
        matches!(self, Self::Validation)
    }
}

/// Common trait for all spell errors.
///
/// Use `#[derive(thiserror::Error)]` for the Display/Error impl and classify
/// severity by how the session reacts, not by how bad it looks.
pub trait SpellError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable code for log filtering and diagnostics.
    fn error_code(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_is_noteworthy() {
        assert!(ErrorSeverity::Validation.is_noteworthy());
        assert!(!ErrorSeverity::Recoverable.is_noteworthy());
        assert!(!ErrorSeverity::Benign.is_noteworthy());
    }
}
