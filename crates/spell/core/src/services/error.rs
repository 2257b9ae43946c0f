use crate::error::{ErrorSeverity, SpellError};

/// Failures when looking up a collaborator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Nothing has been provided under this name yet.
    #[error("service `{name}` is not available")]
    Unavailable { name: &'static str },

    /// A provider exists but was published with a different type.
    #[error("service `{name}` was provided with a different type")]
    TypeMismatch { name: &'static str },
}

impl SpellError for ServiceError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable { .. } => ErrorSeverity::Recoverable,
            Self::TypeMismatch { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::TypeMismatch { .. } => "SERVICE_TYPE_MISMATCH",
        }
    }
}
