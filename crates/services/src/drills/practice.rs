use std::fmt;
use std::sync::Arc;

use tracing::warn;

use drill_core::{Answer, QuestionId};
use storage::repository::{ProgressRepository, QuestionRepository, RecordFilter, StorageError};

use super::queries::DrillQueries;
use super::session::DrillEntry;
use crate::error::{PracticeError, ProgressServiceError};
use crate::progress::ProgressService;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Tally of a finished (or running) practice run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSummary {
    /// Questions the run started with.
    pub total: usize,
    /// Questions actually graded; skipped questions are not counted.
    pub answered: usize,
    pub correct: usize,
}

impl PracticeSummary {
    /// Share of correct answers over the full run, floored to whole percent.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let correct = u32::try_from(self.correct).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        correct.saturating_mul(100) / total
    }
}

/// Sequential timed-test run: every selected question is presented exactly
/// once, answers are tallied, and the run ends at the last question.
///
/// Unlike the mastery drill there is no cycling and no eviction threshold;
/// a question leaves the run the moment it is answered (or skipped).
pub struct PracticeSession {
    entries: Vec<DrillEntry>,
    current: usize,
    answered: usize,
    correct: usize,
}

impl PracticeSession {
    /// Wrap a resolved selection into a run positioned at its first question.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Empty` when the selection matched nothing.
    pub fn new(entries: Vec<DrillEntry>) -> Result<Self, PracticeError> {
        if entries.is_empty() {
            return Err(PracticeError::Empty);
        }
        Ok(Self {
            entries,
            current: 0,
            answered: 0,
            correct: 0,
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.entries.len()
    }

    /// The question currently presented, until the run completes.
    #[must_use]
    pub fn current(&self) -> Option<&DrillEntry> {
        self.entries.get(self.current)
    }

    /// How far the learner is through the run, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.is_complete() {
            return 100.0;
        }
        (self.current + 1) as f64 / self.entries.len() as f64 * 100.0
    }

    #[must_use]
    pub fn summary(&self) -> PracticeSummary {
        PracticeSummary {
            total: self.total(),
            answered: self.answered,
            correct: self.correct,
        }
    }

    /// Tally a graded answer and move to the next question.
    pub(crate) fn record_answer(&mut self, answer: Answer) {
        self.answered += 1;
        if answer.is_correct() {
            self.correct += 1;
        }
        self.current += 1;
    }

    /// Move past the current question without tallying it.
    pub(crate) fn skip_current(&mut self) {
        self.current += 1;
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("entries_len", &self.entries.len())
            .field("current", &self.current)
            .field("answered", &self.answered)
            .field("correct", &self.correct)
            .finish_non_exhaustive()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Result of answering one practice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeStep {
    Answered {
        answer: Answer,
        /// Position at which the correct option was shown.
        correct_position: usize,
    },
    /// The record behind the question vanished; nothing was tallied.
    Skipped { question_id: QuestionId },
}

/// Orchestrates the fixed-total timed practice flow.
#[derive(Clone)]
pub struct PracticeService {
    questions: Arc<dyn QuestionRepository>,
    records: Arc<dyn ProgressRepository>,
    progress: ProgressService,
}

impl PracticeService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, records: Arc<dyn ProgressRepository>) -> Self {
        let progress = ProgressService::new(records.clone());
        Self {
            questions,
            records,
            progress,
        }
    }

    /// Select up to `total` questions (a third new, the rest backfilled from
    /// the mature pool) and start a run over them.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Empty` when nothing matched and
    /// `PracticeError::Storage` on fetch failures.
    pub async fn start_practice(
        &self,
        filter: &RecordFilter,
        total: u32,
    ) -> Result<PracticeSession, PracticeError> {
        let plan =
            DrillQueries::build_fixed_total_plan(self.records.as_ref(), filter, total).await?;
        let entries = DrillQueries::resolve_entries(self.questions.as_ref(), plan).await?;
        PracticeSession::new(entries)
    }

    /// Grade the picked position, persist the score update, and tally.
    ///
    /// Follows the same write-before-commit and missing-record discipline
    /// as the drill loop: the run only moves on once the store accepted the
    /// update, and a vanished record skips the question with a warning.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` past the last question, choice
    /// range errors, and storage errors other than the handled `NotFound`.
    pub async fn answer_current(
        &self,
        session: &mut PracticeSession,
        position: usize,
    ) -> Result<PracticeStep, PracticeError> {
        let (answer, question_id, record, correct_position) = {
            let entry = session.current().ok_or(PracticeError::Completed)?;
            (
                entry.grade(position)?,
                entry.question().id().clone(),
                entry.record().clone(),
                entry.presentation().correct_position(),
            )
        };

        match self.progress.record_answer(&record, answer).await {
            Ok(_stored) => {
                session.record_answer(answer);
                Ok(PracticeStep::Answered {
                    answer,
                    correct_position,
                })
            }
            Err(ProgressServiceError::Storage(StorageError::NotFound)) => {
                warn!(question_id = %question_id, "progress record vanished; skipping question");
                session.skip_current();
                Ok(PracticeStep::Skipped { question_id })
            }
            Err(err) => Err(err.into()),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::{ProgressRecord, QuestionDraft, RecordId};
    use storage::repository::InMemoryRepository;

    fn build_entry(id: &str, correct: usize) -> DrillEntry {
        let question = QuestionDraft::new(
            format!("Prompt {id}"),
            vec!["a".into(), "b".into(), "c".into()],
            correct,
            "",
            "math",
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id));
        let record = ProgressRecord::new(
            RecordId::new(format!("r-{id}")),
            question.id().clone(),
            "math",
            vec![],
        );
        DrillEntry::new(question, record)
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(matches!(
            PracticeSession::new(vec![]),
            Err(PracticeError::Empty)
        ));
    }

    #[test]
    fn run_steps_through_every_question_once() {
        let mut session =
            PracticeSession::new(vec![build_entry("a", 0), build_entry("b", 1)]).unwrap();

        assert_eq!(session.total(), 2);
        assert!((session.progress_percent() - 50.0).abs() < f64::EPSILON);

        session.record_answer(Answer::Correct);
        assert!(!session.is_complete());
        session.record_answer(Answer::Incorrect);
        assert!(session.is_complete());
        assert!(session.current().is_none());

        let summary = session.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.answered, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.percent(), 50);
    }

    #[test]
    fn skipped_questions_do_not_count_toward_the_tally() {
        let mut session =
            PracticeSession::new(vec![build_entry("a", 0), build_entry("b", 1)]).unwrap();

        session.skip_current();
        session.record_answer(Answer::Correct);

        let summary = session.summary();
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.percent(), 50);
    }

    #[test]
    fn percent_floors_and_handles_empty_totals() {
        let summary = PracticeSummary {
            total: 3,
            answered: 3,
            correct: 2,
        };
        assert_eq!(summary.percent(), 66);

        let empty = PracticeSummary {
            total: 0,
            answered: 0,
            correct: 0,
        };
        assert_eq!(empty.percent(), 0);
    }

    #[tokio::test]
    async fn service_persists_each_graded_answer() {
        let repo = InMemoryRepository::new();
        for i in 0..2 {
            let question = QuestionDraft::new(
                format!("Q{i}"),
                vec!["a".into(), "b".into()],
                0,
                "",
                "math",
            )
            .validate()
            .unwrap()
            .assign_id(QuestionId::generate());
            repo.insert_question(&question).await.unwrap();
            repo.insert_record(&ProgressRecord::new(
                RecordId::generate(),
                question.id().clone(),
                "math",
                vec![],
            ))
            .await
            .unwrap();
        }
        let service = PracticeService::new(Arc::new(repo.clone()), Arc::new(repo.clone()));

        let mut session = service
            .start_practice(&RecordFilter::all(), 6)
            .await
            .unwrap();
        assert_eq!(session.total(), 2);

        while !session.is_complete() {
            let position = session.current().unwrap().presentation().correct_position();
            let step = service.answer_current(&mut session, position).await.unwrap();
            assert!(matches!(step, PracticeStep::Answered { .. }));
        }

        let summary = session.summary();
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.percent(), 100);
        let stored = repo
            .newest_records(&RecordFilter::all(), 10)
            .await
            .unwrap();
        assert!(stored.iter().all(|record| record.total_attempts == 1));
    }

    #[tokio::test]
    async fn answering_past_the_end_is_completed() {
        let repo = InMemoryRepository::new();
        let service = PracticeService::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let mut session = PracticeSession::new(vec![build_entry("a", 0)]).unwrap();
        session.skip_current();

        let err = service.answer_current(&mut session, 0).await.unwrap_err();
        assert!(matches!(err, PracticeError::Completed));
    }
}
