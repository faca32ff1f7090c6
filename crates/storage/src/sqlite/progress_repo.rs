use std::collections::HashMap;

use chrono::Utc;
use drill_core::{ProgressRecord, QuestionId, graduate};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_record_row, ser},
};
use crate::repository::{ProgressRepository, RecordFilter, StorageError, SubjectFilter};

fn insert_error(e: sqlx::Error) -> StorageError {
    if e.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
    {
        StorageError::Conflict
    } else {
        StorageError::Connection(e.to_string())
    }
}

impl SqliteRepository {
    /// Tags for a batch of record ids, keyed by record id. Records without
    /// tags simply have no entry.
    async fn tags_for_records(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut sql = String::from("SELECT record_id, tag FROM record_tags WHERE record_id IN (");
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(") ORDER BY record_id ASC, tag ASC");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let record_id: String = row.try_get("record_id").map_err(ser)?;
            let tag: String = row.try_get("tag").map_err(ser)?;
            tags.entry(record_id).or_default().push(tag);
        }
        Ok(tags)
    }

    /// Shared selection path for the new and mature pools. `min_attempts`
    /// is the strict lower bound on the attempt counter, if any.
    async fn select_records(
        &self,
        filter: &RecordFilter,
        min_attempts: Option<u32>,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let mut sql = String::from(
            r"
            SELECT
                id, question_id, subject, correct_count, wrong_count, total_attempts,
                long_term_score, middle_term_score, short_term_score, easy_rating
            FROM progress_records
            ",
        );

        let mut conditions: Vec<String> = Vec::new();
        let mut next = 1_usize;

        if min_attempts.is_some() {
            conditions.push(format!("total_attempts > ?{next}"));
            next += 1;
        }
        if matches!(filter.subject, SubjectFilter::Named(_)) {
            conditions.push(format!("subject = ?{next}"));
            next += 1;
        }
        if !filter.tags.is_empty() {
            let mut placeholders = String::new();
            for i in 0..filter.tags.len() {
                if i > 0 {
                    placeholders.push_str(", ");
                }
                placeholders.push('?');
                placeholders.push_str(&(next + i).to_string());
            }
            next += filter.tags.len();
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM record_tags rt \
                 WHERE rt.record_id = progress_records.id AND rt.tag IN ({placeholders}))"
            ));
        }

        if !conditions.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&conditions.join(" AND "));
            sql.push('\n');
        }
        sql.push_str(&format!("ORDER BY total_attempts ASC, id ASC LIMIT ?{next}"));

        let mut q = sqlx::query(&sql);
        if let Some(gate) = min_attempts {
            q = q.bind(i64::from(gate));
        }
        if let SubjectFilter::Named(label) = &filter.subject {
            q = q.bind(label);
        }
        for tag in &filter.tags {
            q = q.bind(tag);
        }
        q = q.bind(i64::from(limit));

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            ids.push(row.try_get::<String, _>("id").map_err(ser)?);
        }
        let mut tag_map = self.tags_for_records(&ids).await?;

        let mut records = Vec::with_capacity(rows.len());
        for (row, id) in rows.iter().zip(&ids) {
            let tags = tag_map.remove(id).unwrap_or_default();
            records.push(map_record_row(row, tags)?);
        }
        Ok(records)
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn insert_record(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO progress_records (
                id, question_id, subject, correct_count, wrong_count, total_attempts,
                long_term_score, middle_term_score, short_term_score, easy_rating,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )
        .bind(record.id.value())
        .bind(record.question_id.value())
        .bind(&record.subject)
        .bind(i64::from(record.correct_count))
        .bind(i64::from(record.wrong_count))
        .bind(i64::from(record.total_attempts))
        .bind(record.long_term_score)
        .bind(record.middle_term_score)
        .bind(record.short_term_score)
        .bind(record.easy_rating)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        for tag in &record.tags {
            sqlx::query("INSERT OR IGNORE INTO record_tags (record_id, tag) VALUES (?1, ?2)")
                .bind(record.id.value())
                .bind(tag)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn newest_records(
        &self,
        filter: &RecordFilter,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.select_records(filter, None, limit).await
    }

    async fn mature_records(
        &self,
        filter: &RecordFilter,
        min_attempts: u32,
        limit: u32,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        self.select_records(filter, Some(min_attempts), limit).await
    }

    async fn update_record(
        &self,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let result = sqlx::query(
            r"
            UPDATE progress_records SET
                question_id = ?2,
                subject = ?3,
                correct_count = ?4,
                wrong_count = ?5,
                total_attempts = ?6,
                long_term_score = ?7,
                middle_term_score = ?8,
                short_term_score = ?9,
                easy_rating = ?10,
                updated_at = ?11
            WHERE id = ?1
            ",
        )
        .bind(record.id.value())
        .bind(record.question_id.value())
        .bind(&record.subject)
        .bind(i64::from(record.correct_count))
        .bind(i64::from(record.wrong_count))
        .bind(i64::from(record.total_attempts))
        .bind(record.long_term_score)
        .bind(record.middle_term_score)
        .bind(record.short_term_score)
        .bind(record.easy_rating)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM record_tags WHERE record_id = ?1")
            .bind(record.id.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for tag in &record.tags {
            sqlx::query("INSERT OR IGNORE INTO record_tags (record_id, tag) VALUES (?1, ?2)")
                .bind(record.id.value())
                .bind(tag)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(record.clone())
    }

    async fn mark_mastered(
        &self,
        question_id: &QuestionId,
    ) -> Result<ProgressRecord, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, question_id, subject, correct_count, wrong_count, total_attempts,
                long_term_score, middle_term_score, short_term_score, easy_rating
            FROM progress_records
            WHERE question_id = ?1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(question_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        let id: String = row.try_get("id").map_err(ser)?;
        let tags = self
            .tags_for_records(std::slice::from_ref(&id))
            .await?
            .remove(&id)
            .unwrap_or_default();
        let record = map_record_row(&row, tags)?;

        self.update_record(&graduate(&record)).await
    }
}
