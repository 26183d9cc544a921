use thiserror::Error as ThisError;
use uniffi::Error;

use crate::error::{BackendError, FoodError, SessionError, ValidationError};

#[derive(Debug, ThisError, Error)]
#[uniffi(flat_error)]
#[non_exhaustive]
pub enum KineticError {
    #[error("{0}")]
    Validation(String),
    #[error("no active workout")]
    NoActiveWorkout,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("busy: {0}")]
    Busy(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("food lookup error: {0}")]
    Food(String),
    #[error("error: {0}")]
    Common(String),
}

impl From<ValidationError> for KineticError {
    fn from(e: ValidationError) -> Self {
        KineticError::Validation(e.to_string())
    }
}

impl From<BackendError> for KineticError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Validation(v) => v.into(),
            other => KineticError::Storage(other.to_string()),
        }
    }
}

impl From<SessionError> for KineticError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NoActiveWorkout => KineticError::NoActiveWorkout,
            SessionError::SetNotFound { .. } | SessionError::ExerciseNotFound(_) => {
                KineticError::NotFound(e.to_string())
            }
            SessionError::SaveInProgress => KineticError::Busy(e.to_string()),
            SessionError::Validation(v) => v.into(),
            SessionError::Backend(b) => b.into(),
        }
    }
}

impl From<FoodError> for KineticError {
    fn from(e: FoodError) -> Self {
        KineticError::Food(e.to_string())
    }
}

impl From<anyhow::Error> for KineticError {
    fn from(e: anyhow::Error) -> Self {
        KineticError::Common(format!("{:#}", e))
    }
}

impl From<std::io::Error> for KineticError {
    fn from(e: std::io::Error) -> Self {
        KineticError::Common(e.to_string())
    }
}

impl From<tokio::task::JoinError> for KineticError {
    fn from(e: tokio::task::JoinError) -> Self {
        KineticError::Common(e.to_string())
    }
}
