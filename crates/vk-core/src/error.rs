//! # AppError
//!
//! Centralized error handling for the Vaahaka ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all vk-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Story, Episode, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, i64),

    /// Malformed or out-of-range submission, naming the offending field
    #[error("validation failed on {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Target kind unrecognized or the id does not resolve
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Reaction kind outside the fixed vocabulary
    #[error("invalid reaction kind: {0}")]
    InvalidReactionKind(String),

    /// Lost race on the reaction uniqueness constraint. The engine
    /// resolves this internally; it is surfaced only when resolution
    /// fails too, in which case a retry is safe.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., database down). Retryable.
    #[error("storage error: {0}")]
    Storage(String),
}

/// A specialized Result type for Vaahaka logic.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Submission referenced no entity, or one that does not exist.
    pub fn invalid_reference() -> Self {
        AppError::InvalidTarget("Invalid content reference".to_string())
    }

    /// Submission carried a kind token outside the closed set.
    pub fn invalid_content_type() -> Self {
        AppError::InvalidTarget("Invalid content type".to_string())
    }

    /// Domain-rule violations are reported to the client inside the
    /// regular response envelope; everything else is a server fault.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(..)
                | AppError::Validation { .. }
                | AppError::InvalidTarget(_)
                | AppError::InvalidReactionKind(_)
        )
    }

    /// Client-safe message. Infrastructure detail never leaks here.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(what, id) => format!("{what} not found with ID {id}"),
            AppError::Validation { reason, .. } => reason.clone(),
            AppError::InvalidTarget(msg) => msg.clone(),
            AppError::InvalidReactionKind(kind) => format!("Invalid reaction type: {kind}"),
            AppError::Conflict(_) | AppError::Storage(_) => {
                "Temporary server error, please try again".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_detail_stays_out_of_public_messages() {
        let err = AppError::Storage("connection refused at 10.0.0.5:5432".to_string());
        assert!(!err.is_domain());
        assert!(!err.public_message().contains("10.0.0.5"));
    }

    #[test]
    fn validation_is_a_domain_error() {
        let err = AppError::Validation {
            field: "username",
            reason: "Username must be at least 2 characters".to_string(),
        };
        assert!(err.is_domain());
        assert_eq!(err.public_message(), "Username must be at least 2 characters");
    }
}
