use std::sync::Arc;

use drill_core::{ProgressRecord, Question, QuestionDraft, QuestionId, RecordId};
use storage::repository::{ProgressRepository, QuestionRepository};

use crate::error::QuestionServiceError;

/// A question and the zeroed progress record minted alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedQuestion {
    pub question: Question,
    pub record: ProgressRecord,
}

/// Orchestrates question ingestion: validate, mint ids, persist the question
/// together with its progress record.
#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    records: Arc<dyn ProgressRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, records: Arc<dyn ProgressRepository>) -> Self {
        Self { questions, records }
    }

    /// Validate a draft and persist it as a question plus a fresh record
    /// carrying `tags` for later filtering.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for validation failures and
    /// `QuestionServiceError::Storage` if either insert fails.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
        tags: Vec<String>,
    ) -> Result<IngestedQuestion, QuestionServiceError> {
        let question = draft.validate()?.assign_id(QuestionId::generate());
        let record = ProgressRecord::new(
            RecordId::generate(),
            question.id().clone(),
            question.subject(),
            tags,
        );

        self.questions.insert_question(&question).await?;
        self.records.insert_record(&record).await?;

        Ok(IngestedQuestion { question, record })
    }

    /// Ingest several drafts in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`QuestionService::create_question`]; drafts before the failed
    /// one stay persisted.
    pub async fn create_questions(
        &self,
        drafts: Vec<(QuestionDraft, Vec<String>)>,
    ) -> Result<Vec<IngestedQuestion>, QuestionServiceError> {
        let mut ingested = Vec::with_capacity(drafts.len());
        for (draft, tags) in drafts {
            ingested.push(self.create_question(draft, tags).await?);
        }
        Ok(ingested)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
