//! Inbound replication failures.
//!
//! None of these are fatal: the offending message is dropped with a
//! diagnostic and the session carries on.

use spell_core::{ActionId, ActorId, ErrorSeverity, SpellError};

#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("unknown action `{action_id}`")]
    UnknownAction { action_id: ActionId },

    #[error("malformed replication message")]
    Malformed(#[from] serde_json::Error),

    #[error("action `{action_id}` carries an invalid payload: {reason}")]
    InvalidPayload {
        action_id: ActionId,
        reason: &'static str,
    },

    #[error("message from {sender} cannot be replayed as a remote cast")]
    InvalidSender { sender: ActorId },
}

impl SpellError for ReplicationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownAction { .. } => ErrorSeverity::Recoverable,
            Self::Malformed(_) | Self::InvalidPayload { .. } | Self::InvalidSender { .. } => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "REPLICATION_UNKNOWN_ACTION",
            Self::Malformed(_) => "REPLICATION_MALFORMED",
            Self::InvalidPayload { .. } => "REPLICATION_INVALID_PAYLOAD",
            Self::InvalidSender { .. } => "REPLICATION_INVALID_SENDER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_actions_are_dropped_quietly_and_bad_messages_loudly() {
        let unknown = ReplicationError::UnknownAction {
            action_id: ActionId::new("meteor"),
        };
        assert!(!unknown.severity().is_noteworthy());

        let echo = ReplicationError::InvalidSender {
            sender: ActorId::LOCAL,
        };
        assert!(echo.severity().is_noteworthy());

        let malformed: ReplicationError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(malformed.severity().is_noteworthy());
        assert_eq!(malformed.error_code(), "REPLICATION_MALFORMED");
    }
}
