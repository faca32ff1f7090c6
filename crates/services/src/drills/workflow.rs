use std::sync::Arc;

use tracing::warn;

use drill_core::{DrillSettings, QuestionId};
use storage::repository::{ProgressRepository, QuestionRepository, RecordFilter, StorageError};

use super::queries::DrillQueries;
use super::session::{AdvanceOutcome, AnswerFeedback, DrillSession};
use crate::error::{DrillError, ProgressServiceError};
use crate::progress::ProgressService;

/// Result of answering the current drill question through the loop service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(AnswerFeedback),
    /// The progress record vanished underneath the drill; the question was
    /// dropped from the working set and the session kept going.
    Skipped { question_id: QuestionId },
}

/// Orchestrates the mastery drill: plans the working set, persists every
/// score update, and reports masteries to the store.
///
/// All writes happen before the session commits the matching state change,
/// so a transient storage failure surfaces as a typed error with the
/// in-memory session untouched and the call safely retryable.
#[derive(Clone)]
pub struct DrillLoopService {
    questions: Arc<dyn QuestionRepository>,
    records: Arc<dyn ProgressRepository>,
    progress: ProgressService,
    settings: DrillSettings,
}

impl DrillLoopService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, records: Arc<dyn ProgressRepository>) -> Self {
        let progress = ProgressService::new(records.clone());
        Self {
            questions,
            records,
            progress,
            settings: DrillSettings::balanced(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: DrillSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Plan a working set for `filter` and start an active session.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Empty` when the selection matched nothing and
    /// `DrillError::Storage` on fetch failures.
    pub async fn start_drill(&self, filter: &RecordFilter) -> Result<DrillSession, DrillError> {
        let plan = DrillQueries::build_plan(
            self.records.as_ref(),
            filter,
            self.settings.new_limit(),
            self.settings.old_limit(),
        )
        .await?;
        let entries = DrillQueries::resolve_entries(self.questions.as_ref(), plan).await?;

        let mut session = DrillSession::new(self.settings);
        session.begin(entries)?;
        Ok(session)
    }

    /// Re-plan a restarted session and make it active again.
    ///
    /// # Errors
    ///
    /// Same as [`DrillLoopService::start_drill`], plus
    /// `DrillError::AlreadyStarted` when the session never restarted.
    pub async fn resume(
        &self,
        session: &mut DrillSession,
        filter: &RecordFilter,
    ) -> Result<(), DrillError> {
        let plan = DrillQueries::build_plan(
            self.records.as_ref(),
            filter,
            self.settings.new_limit(),
            self.settings.old_limit(),
        )
        .await?;
        let entries = DrillQueries::resolve_entries(self.questions.as_ref(), plan).await?;
        session.begin(entries)
    }

    /// Grade the picked position, persist the score update, and commit the
    /// answer to the session.
    ///
    /// A record that disappeared from the store is skipped: the question is
    /// dropped from the working set with a warning and the drill continues,
    /// possibly completing if it was the last question.
    ///
    /// # Errors
    ///
    /// Session guards (`Completed`, `AlreadyAnswered`, choice range) and
    /// storage errors other than the handled `NotFound`.
    pub async fn answer_current(
        &self,
        session: &mut DrillSession,
        position: usize,
    ) -> Result<AnswerOutcome, DrillError> {
        let answer = session.grade_choice(position)?;
        let (question_id, record) = {
            let entry = session.current().ok_or(DrillError::Completed)?;
            (entry.question().id().clone(), entry.record().clone())
        };

        match self.progress.record_answer(&record, answer).await {
            Ok(stored) => {
                let feedback = session.commit_answer(answer, Some(stored))?;
                Ok(AnswerOutcome::Answered(feedback))
            }
            Err(ProgressServiceError::Storage(StorageError::NotFound)) => {
                warn!(question_id = %question_id, "progress record vanished; dropping question");
                session.delete_current()?;
                Ok(AnswerOutcome::Skipped { question_id })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Advance past the answered question, reporting every mastered
    /// question to the store before the session evicts it.
    ///
    /// # Errors
    ///
    /// Session guards (`NotAnswered`, `Completed`) and storage errors; a
    /// mastered question whose record is already gone is only warned about.
    pub async fn advance(&self, session: &mut DrillSession) -> Result<AdvanceOutcome, DrillError> {
        for question_id in session.pending_evictions()? {
            match self.records.mark_mastered(&question_id).await {
                Ok(_) => {}
                Err(StorageError::NotFound) => {
                    warn!(question_id = %question_id, "no record left to mark mastered");
                }
                Err(err) => return Err(err.into()),
            }
        }
        session.advance()
    }

    /// Drop the current question from the working set on explicit request.
    ///
    /// Purely session-local: removing stored content is a content-management
    /// concern and not part of the drill.
    ///
    /// # Errors
    ///
    /// Session phase guards only.
    pub fn delete_current(&self, session: &mut DrillSession) -> Result<QuestionId, DrillError> {
        Ok(session.delete_current()?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
