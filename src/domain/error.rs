use thiserror::Error;

use crate::domain::workflow::TransitionError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("`{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("invalid input: {message}")]
    Validation { message: String },
    #[error("status cannot move from {from} to {to}")]
    StatusRegression {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
