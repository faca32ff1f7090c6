//! Repository traits plus the in-memory backend.
//!
//! The service layer only ever talks to [`QuestionRepository`] and
//! [`ProgressRepository`]; which backend sits behind them is wiring.
//! [`InMemoryRepository`] implements both over shared hash maps and is
//! the backend of choice for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use drill_core::{ProgressRecord, Question, QuestionId, RecordId, graduate};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// No stored row matches the requested id.
    #[error("entity not found")]
    NotFound,

    /// An insert collided with an existing row id.
    #[error("an entity with this id already exists")]
    Conflict,

    /// The backend could not be reached or a statement failed.
    #[error("storage backend failure: {0}")]
    Connection(String),

    /// A stored row could not be decoded back into a domain value.
    #[error("stored data could not be decoded: {0}")]
    Serialization(String),
}

//
// ─── SELECTION FILTERS ─────────────────────────────────────────────────────────
//

/// Subject dimension of a record selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectFilter {
    /// Match records from every subject.
    All,
    /// Match records whose subject equals the label exactly.
    Named(String),
}

impl SubjectFilter {
    #[must_use]
    pub fn matches(&self, subject: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(label) => label == subject,
        }
    }
}

/// Record selection used by the drill planner.
///
/// Both dimensions must hold: the subject must match, and when `tags` is
/// non-empty the record must carry at least one of the listed tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub subject: SubjectFilter,
    pub tags: Vec<String>,
}

impl RecordFilter {
    /// Filter that matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self {
            subject: SubjectFilter::All,
            tags: Vec::new(),
        }
    }

    /// Filter scoped to a single subject label.
    #[must_use]
    pub fn subject(label: impl Into<String>) -> Self {
        Self {
            subject: SubjectFilter::Named(label.into()),
            tags: Vec::new(),
        }
    }

    /// Narrows the filter to records carrying at least one of `tags`.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn matches(&self, record: &ProgressRecord) -> bool {
        self.subject.matches(&record.subject)
            && (self.tags.is_empty() || record.has_any_tag(&self.tags))
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::all()
    }
}

//
// ─── REPOSITORY TRAITS ─────────────────────────────────────────────────────────
//

/// Read/write access to drill questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Stores a new question under its id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when a question with the same id
    /// already exists.
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetches a single question by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no question has this id.
    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError>;

    /// Fetches the questions whose ids appear in `ids`.
    ///
    /// Ids without a stored question are silently absent from the result;
    /// callers decide whether a gap matters. Output follows input order
    /// with duplicate ids collapsed.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backend itself fails.
    async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;
}

/// Read/write access to per-question progress records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Stores a new record under its id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] when a record with the same id
    /// already exists.
    async fn insert_record(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Matching records with the fewest attempts first, capped at `limit`.
    ///
    /// Ties on the attempt counter break on record id so repeated calls
    /// see one stable order.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    async fn newest_records(
        &self,
        filter: &RecordFilter,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Matching records with strictly more than `min_attempts` attempts,
    /// fewest attempts first, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails.
    async fn mature_records(
        &self,
        filter: &RecordFilter,
        min_attempts: u32,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Replaces the stored copy of `record` and returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no record with this id
    /// exists any more, e.g. because it was deleted underneath a running
    /// drill.
    async fn update_record(&self, record: &ProgressRecord)
    -> Result<ProgressRecord, StorageError>;

    /// Force-graduates the record belonging to `question_id` past the
    /// maturity gate so the question stops surfacing in the new pool.
    ///
    /// Scores and counters other than the attempt total are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no record tracks this
    /// question.
    async fn mark_mastered(&self, question_id: &QuestionId)
    -> Result<ProgressRecord, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Hash-map backend for tests and throwaway runs.
///
/// Clones share the same underlying maps, so one instance can be handed
/// to several services.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    records: Arc<Mutex<HashMap<RecordId, ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn order_for_pick(records: &mut [ProgressRecord]) {
    records.sort_by(|a, b| {
        a.total_attempts
            .cmp(&b.total_attempts)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut questions = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if questions.contains_key(question.id()) {
            return Err(StorageError::Conflict);
        }
        questions.insert(question.id().clone(), question.clone());
        Ok(())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let questions = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        questions.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let questions = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if let Some(question) = questions.get(id) {
                found.push(question.clone());
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn insert_record(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if records.contains_key(&record.id) {
            return Err(StorageError::Conflict);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn newest_records(
        &self,
        filter: &RecordFilter,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut selected: Vec<ProgressRecord> = records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        order_for_pick(&mut selected);
        selected.truncate(limit as usize);
        Ok(selected)
    }

    async fn mature_records(
        &self,
        filter: &RecordFilter,
        min_attempts: u32,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut selected: Vec<ProgressRecord> = records
            .values()
            .filter(|record| record.total_attempts > min_attempts && filter.matches(record))
            .cloned()
            .collect();
        order_for_pick(&mut selected);
        selected.truncate(limit as usize);
        Ok(selected)
    }

    async fn update_record(
        &self,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, StorageError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if !records.contains_key(&record.id) {
            return Err(StorageError::NotFound);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn mark_mastered(
        &self,
        question_id: &QuestionId,
    ) -> Result<ProgressRecord, StorageError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let target = records
            .values()
            .find(|record| &record.question_id == question_id)
            .map(|record| record.id.clone())
            .ok_or(StorageError::NotFound)?;
        let entry = records.get_mut(&target).ok_or(StorageError::NotFound)?;
        let updated = graduate(entry);
        *entry = updated;
        Ok(entry.clone())
    }
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Bundle of repository handles the service layer threads around.
#[derive(Clone)]
pub struct Store {
    pub questions: Arc<dyn QuestionRepository>,
    pub records: Arc<dyn ProgressRepository>,
}

impl Store {
    /// Store backed by in-process hash maps. Both handles share one
    /// backend instance.
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = InMemoryRepository::new();
        Self {
            questions: Arc::new(backend.clone()),
            records: Arc::new(backend),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
