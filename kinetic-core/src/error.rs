//! Error types shared across the core.
//!
//! Validation problems never mutate state. Backend and food lookup failures are
//! surfaced to the caller with the in-memory session left untouched. Not-found
//! outcomes are modelled as `Option::None` and never appear here.

use thiserror::Error;

/// User input that cannot be accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routine name must not be empty")]
    EmptyRoutineName,
    #[error("routine must contain at least one exercise")]
    NoExercises,
    #[error("exercise name must not be empty")]
    EmptyExerciseName,
    #[error("set needs a weight and reps before it can be completed")]
    EmptySetValues,
    #[error("no completed sets to save")]
    NothingToSave,
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Transport(String),
    #[error("backend rejected the write: {0}")]
    Constraint(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure reported by the food data collaborator.
#[derive(Debug, Error)]
pub enum FoodError {
    #[error("food lookup failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected food lookup response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("food lookup returned status {0}")]
    Status(u16),
}

/// Errors returned by the workout session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active workout")]
    NoActiveWorkout,
    #[error("no set at exercise {exercise_index}, set {set_index}")]
    SetNotFound {
        exercise_index: usize,
        set_index: usize,
    },
    #[error("no exercise at index {0}")]
    ExerciseNotFound(usize),
    #[error("a save is already in progress")]
    SaveInProgress,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
