use drill_core::{ProgressRecord, QuestionId};

/// Selection result for one drill: the chosen records with the new pool
/// first, then the mature pool.
///
/// The two pools are concatenated without deduplication. The maturity gate
/// makes them disjoint in the steady state, but a record sitting right at
/// the gate while a drill runs can surface in both fetches; callers must
/// tolerate seeing it twice.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillPlan {
    records: Vec<ProgressRecord>,
    new_selected: usize,
    old_selected: usize,
}

impl DrillPlan {
    /// Combine the two store fetches into one ordered plan.
    #[must_use]
    pub fn combine(new: Vec<ProgressRecord>, old: Vec<ProgressRecord>) -> Self {
        let new_selected = new.len();
        let old_selected = old.len();
        let mut records = new;
        records.extend(old);
        Self {
            records,
            new_selected,
            old_selected,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ProgressRecord> {
        self.records
    }

    #[must_use]
    pub fn new_selected(&self) -> usize {
        self.new_selected
    }

    #[must_use]
    pub fn old_selected(&self) -> usize {
        self.old_selected
    }

    /// Total number of records in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no records were selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Question ids of every selected record, in plan order.
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.records
            .iter()
            .map(|record| record.question_id.clone())
            .collect()
    }
}

/// New-pool quota of a fixed-total request: a third of the total, floored.
#[must_use]
pub fn new_share_of_total(total: u32) -> u32 {
    total / 3
}

/// Mature-pool quota after the new fetch returned `new_returned` records.
///
/// The old pool backfills whatever the new query under-delivered, so the
/// combined plan never exceeds `total`.
#[must_use]
pub fn old_backfill(total: u32, new_returned: usize) -> u32 {
    let returned = u32::try_from(new_returned).unwrap_or(u32::MAX);
    total.saturating_sub(returned)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
