//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::{QuestionError, QuestionId, SettingsError};
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("no progress record tracks question {0}")]
    Untracked(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the drill session and its loop service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillError {
    #[error("no questions matched the drill selection")]
    Empty,
    #[error("drill already started")]
    AlreadyStarted,
    #[error("drill already completed")]
    Completed,
    #[error("drill has not started yet")]
    NotActive,
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the timed practice flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("no questions matched the practice selection")]
    Empty,
    #[error("practice already completed")]
    Completed,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
