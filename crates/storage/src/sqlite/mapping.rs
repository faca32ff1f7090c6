use drill_core::{ProgressRecord, Question, QuestionId, RecordId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn correct_answer_to_i64(correct_answer: usize) -> Result<i64, StorageError> {
    i64::try_from(correct_answer)
        .map_err(|_| StorageError::Serialization("correct_answer overflow".into()))
}

/// Rebuilds a domain question from its row, re-running the content
/// invariants so corrupt rows surface as serialization errors instead of
/// leaking into a drill.
pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options = options_from_json(&row.try_get::<String, _>("options").map_err(ser)?)?;

    let correct_answer_i64: i64 = row.try_get("correct_answer").map_err(ser)?;
    let correct_answer = usize::try_from(correct_answer_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid correct_answer: {correct_answer_i64}"))
    })?;

    Question::from_persisted(
        QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        correct_answer,
        row.try_get::<String, _>("explanation").map_err(ser)?,
        row.try_get::<String, _>("subject").map_err(ser)?,
    )
    .map_err(ser)
}

/// Rebuilds a progress record from its row plus the tags fetched from the
/// join table.
pub(crate) fn map_record_row(
    row: &sqlx::sqlite::SqliteRow,
    tags: Vec<String>,
) -> Result<ProgressRecord, StorageError> {
    Ok(ProgressRecord {
        id: RecordId::new(row.try_get::<String, _>("id").map_err(ser)?),
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        subject: row.try_get("subject").map_err(ser)?,
        tags,
        correct_count: i64_to_u32("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        wrong_count: i64_to_u32("wrong_count", row.try_get("wrong_count").map_err(ser)?)?,
        total_attempts: i64_to_u32(
            "total_attempts",
            row.try_get("total_attempts").map_err(ser)?,
        )?,
        long_term_score: row.try_get("long_term_score").map_err(ser)?,
        middle_term_score: row.try_get("middle_term_score").map_err(ser)?,
        short_term_score: row.try_get("short_term_score").map_err(ser)?,
        easy_rating: row.try_get("easy_rating").map_err(ser)?,
    })
}
