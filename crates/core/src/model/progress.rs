use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, RecordId};

/// Attempts above this count place a record in the "old/mature" selection
/// pool; at or below it the record still counts as "new".
pub const MATURITY_GATE: u32 = 10;

/// Ease rating seeded into freshly created records. Below the maturity
/// growth divisor, so new records always advance their attempt counter by 1.
pub const INITIAL_EASY_RATING: i64 = 3;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// Outcome of one answered attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Correct,
    Incorrect,
}

impl Answer {
    #[must_use]
    pub fn from_correct(is_correct: bool) -> Self {
        if is_correct {
            Answer::Correct
        } else {
            Answer::Incorrect
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Answer::Correct)
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Mutable mastery-tracking state for one question.
///
/// One record exists per question, created at ingestion and updated exactly
/// once per answered attempt (see `mastery::apply_answer`). The record never
/// reads a clock: `total_attempts` doubles as the due-for-review proxy, with
/// its growth rate driven by `easy_rating` once past [`MATURITY_GATE`].
///
/// Scores are kept as signed integers: the middle-term score may transiently
/// sit outside [0, 100] when seeded with off-grid values, and the boundary
/// rules pull it back on the next update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: RecordId,
    pub question_id: QuestionId,
    pub subject: String,
    pub tags: Vec<String>,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub total_attempts: u32,
    pub long_term_score: i64,
    pub middle_term_score: i64,
    pub short_term_score: i64,
    pub easy_rating: i64,
}

impl ProgressRecord {
    /// Creates the zeroed record that accompanies a newly ingested question.
    #[must_use]
    pub fn new(
        id: RecordId,
        question_id: QuestionId,
        subject: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id,
            question_id,
            subject: subject.into(),
            tags,
            correct_count: 0,
            wrong_count: 0,
            total_attempts: 0,
            long_term_score: 0,
            middle_term_score: 0,
            short_term_score: 0,
            easy_rating: INITIAL_EASY_RATING,
        }
    }

    /// True once the record has crossed the maturity gate and belongs to the
    /// "old" selection pool.
    #[must_use]
    pub fn is_mature(&self) -> bool {
        self.total_attempts > MATURITY_GATE
    }

    /// True if the record's tag set contains any of the given tags.
    #[must_use]
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record() -> ProgressRecord {
        ProgressRecord::new(
            RecordId::new("r1"),
            QuestionId::new("q1"),
            "math",
            vec!["algebra".into(), "basics".into()],
        )
    }

    #[test]
    fn new_record_is_zeroed_with_neutral_ease() {
        let record = build_record();
        assert_eq!(record.correct_count, 0);
        assert_eq!(record.wrong_count, 0);
        assert_eq!(record.total_attempts, 0);
        assert_eq!(record.long_term_score, 0);
        assert_eq!(record.middle_term_score, 0);
        assert_eq!(record.short_term_score, 0);
        assert_eq!(record.easy_rating, INITIAL_EASY_RATING);
    }

    #[test]
    fn maturity_gate_is_strict() {
        let mut record = build_record();
        record.total_attempts = MATURITY_GATE;
        assert!(!record.is_mature());
        record.total_attempts = MATURITY_GATE + 1;
        assert!(record.is_mature());
    }

    #[test]
    fn has_any_tag_is_match_any() {
        let record = build_record();
        assert!(record.has_any_tag(&["geometry".into(), "basics".into()]));
        assert!(!record.has_any_tag(&["geometry".into()]));
        assert!(!record.has_any_tag(&[]));
    }

    #[test]
    fn answer_from_correct() {
        assert_eq!(Answer::from_correct(true), Answer::Correct);
        assert_eq!(Answer::from_correct(false), Answer::Incorrect);
        assert!(Answer::Correct.is_correct());
        assert!(!Answer::Incorrect.is_correct());
    }
}
