use std::collections::{HashMap, HashSet};

use chrono::Utc;
use drill_core::{Question, QuestionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{correct_answer_to_i64, map_question_row, options_to_json, ser},
};
use crate::repository::{QuestionRepository, StorageError};

fn insert_error(e: sqlx::Error) -> StorageError {
    if e.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
    {
        StorageError::Conflict
    } else {
        StorageError::Connection(e.to_string())
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (
                id, prompt, options, correct_answer, explanation, subject, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(question.id().value())
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(correct_answer_to_i64(question.correct_answer())?)
        .bind(question.explanation())
        .bind(question.subject())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, prompt, options, correct_answer, explanation, subject
            FROM questions
            WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let row = row.ok_or(StorageError::NotFound)?;
        map_question_row(&row)
    }

    async fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT id, prompt, options, correct_answer, explanation, subject
            FROM questions
            WHERE id IN (
            ",
        );

        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\n");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id.value());
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut by_id: HashMap<String, Question> = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(ser)?;
            by_id.insert(id, map_question_row(&row)?);
        }

        // Input order, duplicates collapsed, absent ids skipped.
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if let Some(question) = by_id.remove(id.value()) {
                out.push(question);
            }
        }

        Ok(out)
    }
}
