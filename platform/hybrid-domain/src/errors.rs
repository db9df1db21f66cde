use serde::Serialize;
use thiserror::Error;

/// Fieldless discriminant of [`CoreError`], for callers that only branch on
/// the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InsufficientData,
    OptimizationFallback,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {reason} (needed {needed}, available {available})")]
    InsufficientData {
        reason: String,
        needed: usize,
        available: usize,
    },

    #[error("optimizer did not converge: {0}")]
    OptimizationFallback(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn insufficient(reason: impl Into<String>, needed: usize, available: usize) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
            needed,
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::InsufficientData { .. } => ErrorKind::InsufficientData,
            CoreError::OptimizationFallback(_) => ErrorKind::OptimizationFallback,
            CoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
