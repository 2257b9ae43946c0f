//! Errors surfaced while assembling a cast session.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cast session requires an action catalog before building")]
    MissingCatalog,

    #[error("action catalog is empty")]
    EmptyCatalog,
}
