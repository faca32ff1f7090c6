use std::collections::HashMap;

use tracing::{debug, warn};

use drill_core::{MATURITY_GATE, Question, QuestionId};
use storage::repository::{ProgressRepository, QuestionRepository, RecordFilter, StorageError};

use super::plan::{self, DrillPlan};
use super::session::DrillEntry;

/// Storage-backed selection queries for drills and practice runs.
pub(crate) struct DrillQueries;

impl DrillQueries {
    /// Pull up to `new_quota` least-seen records plus up to `old_quota`
    /// mature records matching `filter`, combined new-first.
    ///
    /// Zero-quota fetches are skipped entirely; zero matches yield an empty
    /// plan, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when a fetch fails.
    pub(crate) async fn build_plan(
        records: &dyn ProgressRepository,
        filter: &RecordFilter,
        new_quota: u32,
        old_quota: u32,
    ) -> Result<DrillPlan, StorageError> {
        let new = if new_quota > 0 {
            records.newest_records(filter, new_quota).await?
        } else {
            Vec::new()
        };
        let old = if old_quota > 0 {
            records.mature_records(filter, MATURITY_GATE, old_quota).await?
        } else {
            Vec::new()
        };

        debug!(new = new.len(), old = old.len(), "drill selection resolved");
        Ok(DrillPlan::combine(new, old))
    }

    /// Fixed-total selection for the timed practice flow: a third of the
    /// total goes to the new pool, and the mature pool backfills whatever
    /// the new fetch under-delivered.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when a fetch fails.
    pub(crate) async fn build_fixed_total_plan(
        records: &dyn ProgressRepository,
        filter: &RecordFilter,
        total: u32,
    ) -> Result<DrillPlan, StorageError> {
        let new_quota = plan::new_share_of_total(total);
        let new = if new_quota > 0 {
            records.newest_records(filter, new_quota).await?
        } else {
            Vec::new()
        };
        let old_quota = plan::old_backfill(total, new.len());
        let old = if old_quota > 0 {
            records.mature_records(filter, MATURITY_GATE, old_quota).await?
        } else {
            Vec::new()
        };

        debug!(
            total,
            new = new.len(),
            old = old.len(),
            "practice selection resolved"
        );
        Ok(DrillPlan::combine(new, old))
    }

    /// Join a plan's records against the content store and pair each with
    /// its question, shuffling the first presentation.
    ///
    /// Records whose question content is missing are dropped with a warning
    /// rather than failing the whole selection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the question fetch itself fails.
    pub(crate) async fn resolve_entries(
        questions: &dyn QuestionRepository,
        plan: DrillPlan,
    ) -> Result<Vec<DrillEntry>, StorageError> {
        let fetched = questions.questions_by_ids(&plan.question_ids()).await?;
        let by_id: HashMap<QuestionId, Question> = fetched
            .into_iter()
            .map(|question| (question.id().clone(), question))
            .collect();

        let mut entries = Vec::with_capacity(plan.total());
        for record in plan.into_records() {
            match by_id.get(&record.question_id) {
                Some(question) => entries.push(DrillEntry::new(question.clone(), record)),
                None => warn!(
                    question_id = %record.question_id,
                    "dropping progress record without stored question"
                ),
            }
        }
        Ok(entries)
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

    fn build_question(prompt: &str) -> Question {
        QuestionDraft::new(
            prompt,
            vec!["a".into(), "b".into()],
            0,
            "",
            "math",
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::generate())
    }

    fn build_record(question: &Question, attempts: u32) -> ProgressRecord {
        let mut record = ProgressRecord::new(
            RecordId::generate(),
            question.id().clone(),
            question.subject(),
            vec![],
        );
        record.total_attempts = attempts;
        record
    }

    async fn seed(repo: &InMemoryRepository, attempts: &[u32]) -> Vec<Question> {
        let mut questions = Vec::new();
        for (i, &n) in attempts.iter().enumerate() {
            let question = build_question(&format!("Q{i}"));
            repo.insert_question(&question).await.unwrap();
            repo.insert_record(&build_record(&question, n)).await.unwrap();
            questions.push(question);
        }
        questions
    }

    #[tokio::test]
    async fn build_plan_mixes_new_and_mature_pools() {
        let repo = InMemoryRepository::new();
        seed(&repo, &[0, 2, 15, 20]).await;

        let plan = DrillQueries::build_plan(&repo, &RecordFilter::all(), 2, 2)
            .await
            .unwrap();

        assert_eq!(plan.new_selected(), 2);
        assert_eq!(plan.old_selected(), 2);
        let attempts: Vec<u32> = plan.records().iter().map(|r| r.total_attempts).collect();
        assert_eq!(attempts, vec![0, 2, 15, 20]);
    }

    #[tokio::test]
    async fn build_plan_tolerates_a_sparse_mature_pool() {
        let repo = InMemoryRepository::new();
        // Only 3 records past the gate; the new pool has plenty.
        seed(&repo, &[0, 1, 2, 3, 4, 11, 12, 13]).await;

        let plan = DrillQueries::build_plan(&repo, &RecordFilter::all(), 5, 5)
            .await
            .unwrap();

        assert_eq!(plan.new_selected(), 5);
        assert_eq!(plan.old_selected(), 3);
        assert!(plan.total() <= 8);
    }

    #[tokio::test]
    async fn build_plan_with_no_matches_is_empty_not_an_error() {
        let repo = InMemoryRepository::new();
        seed(&repo, &[0, 1]).await;

        let plan = DrillQueries::build_plan(&repo, &RecordFilter::subject("history"), 5, 5)
            .await
            .unwrap();

        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn fixed_total_plan_backfills_from_the_mature_pool() {
        let repo = InMemoryRepository::new();
        // One new record; the mature pool has to cover the rest.
        seed(&repo, &[0, 11, 12, 13, 14, 15]).await;

        let plan = DrillQueries::build_fixed_total_plan(&repo, &RecordFilter::all(), 6)
            .await
            .unwrap();

        // New quota = floor(6/3) = 2; the new fetch has no maturity gate,
        // so it returns the two least-attempted records (0 and 11), and
        // the mature quota backfills 6 - 2 = 4. The record at 11 attempts
        // legitimately shows up in both pools.
        assert_eq!(plan.new_selected(), 2);
        assert_eq!(plan.old_selected(), 4);
        assert_eq!(plan.total(), 6);
    }

    #[tokio::test]
    async fn fixed_total_plan_never_exceeds_the_request() {
        let repo = InMemoryRepository::new();
        seed(&repo, &[0, 1, 11]).await;

        let plan = DrillQueries::build_fixed_total_plan(&repo, &RecordFilter::all(), 9)
            .await
            .unwrap();

        assert!(plan.total() <= 9);
        assert_eq!(plan.new_selected(), 3);
        assert_eq!(plan.old_selected(), 1);
    }

    #[tokio::test]
    async fn small_totals_skip_the_new_fetch() {
        let repo = InMemoryRepository::new();
        seed(&repo, &[0, 11]).await;

        let plan = DrillQueries::build_fixed_total_plan(&repo, &RecordFilter::all(), 2)
            .await
            .unwrap();

        // floor(2/3) = 0: everything comes from the mature pool.
        assert_eq!(plan.new_selected(), 0);
        assert_eq!(plan.old_selected(), 1);
    }

    #[tokio::test]
    async fn resolve_entries_joins_and_skips_missing_questions() {
        let repo = InMemoryRepository::new();
        let questions = seed(&repo, &[0, 1]).await;
        // A record pointing at content that was never stored.
        let orphan = ProgressRecord::new(
            RecordId::generate(),
            QuestionId::generate(),
            "math",
            vec![],
        );
        repo.insert_record(&orphan).await.unwrap();

        let plan = DrillQueries::build_plan(&repo, &RecordFilter::all(), 10, 0)
            .await
            .unwrap();
        assert_eq!(plan.total(), 3);

        let entries = DrillQueries::resolve_entries(&repo, plan).await.unwrap();

        assert_eq!(entries.len(), 2);
        let ids: Vec<&QuestionId> = entries.iter().map(|e| e.question().id()).collect();
        assert!(ids.contains(&questions[0].id()));
        assert!(ids.contains(&questions[1].id()));
    }
}
