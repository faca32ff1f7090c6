use std::sync::Arc;

use drill_core::{Answer, ProgressRecord, QuestionId, apply_answer};
use storage::repository::ProgressRepository;

use crate::error::ProgressServiceError;

/// Applies answer outcomes to progress records and persists the result.
///
/// The score math itself lives in `drill_core::mastery`; this service only
/// sequences "compute, then write" so a failed write never leaves a session
/// holding scores the store does not have.
#[derive(Clone)]
pub struct ProgressService {
    records: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(records: Arc<dyn ProgressRepository>) -> Self {
        Self { records }
    }

    /// Apply one answer outcome to `record` and persist the updated copy.
    ///
    /// Returns the stored record; the input is untouched, so on failure the
    /// caller still holds the last-persisted state and may retry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) when the record was deleted
    /// underneath the session, or other storage errors on backend failure.
    pub async fn record_answer(
        &self,
        record: &ProgressRecord,
        answer: Answer,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let updated = apply_answer(record, answer);
        Ok(self.records.update_record(&updated).await?)
    }

    /// Find the record in `batch` that tracks `question_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Untracked` when no record in the batch
    /// references the question.
    pub fn resolve<'a>(
        batch: &'a [ProgressRecord],
        question_id: &QuestionId,
    ) -> Result<&'a ProgressRecord, ProgressServiceError> {
        batch
            .iter()
            .find(|record| &record.question_id == question_id)
            .ok_or_else(|| ProgressServiceError::Untracked(question_id.clone()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
