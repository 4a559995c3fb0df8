//! Error types for the protection engine

use thiserror::Error;

/// Protection engine errors
#[derive(Debug, Error)]
pub enum ProtectorError {
    /// No subject was attached to the protected instance
    #[error("Unrestricted: no subject is attached to this instance")]
    Unrestricted,

    /// The field provider of a rule set failed to produce the field universe
    #[error("Field universe unavailable: {0}")]
    MissingFieldUniverse(#[source] anyhow::Error),

    /// A rule declared a grant the engine cannot represent
    #[error("Invalid condition on field '{field}': {reason}")]
    InvalidCondition {
        field: String,
        reason: String,
    },

    /// An action name was empty
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Internal error raised from inside a rule
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ProtectorError {
    /// Returns true for the error reported by an unrestricted `subject()` lookup
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ProtectorError::Unrestricted)
    }
}

/// Result type for protection operations
pub type Result<T> = std::result::Result<T, ProtectorError>;
