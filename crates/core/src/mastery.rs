use crate::model::{Answer, MATURITY_GATE, ProgressRecord};

//
// ─── SCORE CONSTANTS ───────────────────────────────────────────────────────────
//

const SCORE_FLOOR: i64 = 0;
const SCORE_CEILING: i64 = 100;

/// Step size of the slow-moving middle-term score.
const MIDDLE_STEP: i64 = 10;
/// Step size of the fast-moving short-term score.
const SHORT_STEP: i64 = 30;

const LONG_WEIGHT: f64 = 0.25;
const MIDDLE_WEIGHT: f64 = 0.35;
const SHORT_WEIGHT: f64 = 0.40;

//
// ─── SCORE STEPS ───────────────────────────────────────────────────────────────
//

/// All-time accuracy percentage, floored. Zero while no attempt exists.
#[must_use]
pub fn long_term_score(correct_count: u32, wrong_count: u32) -> i64 {
    let total = i64::from(correct_count) + i64::from(wrong_count);
    if total == 0 {
        return 0;
    }
    i64::from(correct_count) * 100 / total
}

/// Advances the middle-term score by one outcome.
///
/// Boundary rules dominate at the edges: at or below zero a correct answer
/// jumps to 10 and a wrong answer stays at 0; at or above 100 a correct
/// answer stays at 100 and a wrong answer only drops to 90. In the interior
/// the score moves ±10 without clamping.
#[must_use]
pub fn middle_term_step(score: i64, answer: Answer) -> i64 {
    if score <= SCORE_FLOOR {
        if answer.is_correct() { MIDDLE_STEP } else { SCORE_FLOOR }
    } else if score >= SCORE_CEILING {
        if answer.is_correct() {
            SCORE_CEILING
        } else {
            SCORE_CEILING - MIDDLE_STEP
        }
    } else if answer.is_correct() {
        score + MIDDLE_STEP
    } else {
        score - MIDDLE_STEP
    }
}

/// Advances the short-term score by one outcome.
///
/// Same shape as [`middle_term_step`] with a ±30 step and edge values
/// {0 → 30 on correct, 100 → 70 on wrong}, plus a final clamp to [0, 100]
/// because the larger interior step can overshoot.
#[must_use]
pub fn short_term_step(score: i64, answer: Answer) -> i64 {
    let stepped = if score <= SCORE_FLOOR {
        if answer.is_correct() { SHORT_STEP } else { SCORE_FLOOR }
    } else if score >= SCORE_CEILING {
        if answer.is_correct() {
            SCORE_CEILING
        } else {
            SCORE_CEILING - SHORT_STEP
        }
    } else if answer.is_correct() {
        score + SHORT_STEP
    } else {
        score - SHORT_STEP
    };
    stepped.clamp(SCORE_FLOOR, SCORE_CEILING)
}

/// Recency-weighted composite of the three scores, floored.
///
/// Weights favor short-term performance (0.25 / 0.35 / 0.40); the result
/// drives how fast the attempt counter grows for mature records.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn easy_rating(long: i64, middle: i64, short: i64) -> i64 {
    (LONG_WEIGHT * long as f64 + MIDDLE_WEIGHT * middle as f64 + SHORT_WEIGHT * short as f64)
        .floor() as i64
}

/// Next value of the attempt counter.
///
/// At or below the maturity gate every attempt counts fully (+1). Past the
/// gate the counter advances by `floor(easy_rating / 10)`, so well-known
/// questions sink faster into the rarely-resurfaced band while struggling
/// ones barely move and stay eligible for reinforcement. Negative stored
/// ratings contribute nothing; the counter never decreases.
#[must_use]
pub fn next_attempt_count(total_attempts: u32, easy_rating: i64) -> u32 {
    if total_attempts <= MATURITY_GATE {
        return total_attempts + 1;
    }
    let growth = u32::try_from(easy_rating.max(0) / 10).unwrap_or(u32::MAX);
    total_attempts.saturating_add(growth)
}

//
// ─── RECORD UPDATE ─────────────────────────────────────────────────────────────
//

/// Applies one answered attempt to a progress record.
///
/// Pure: returns the updated record and leaves the input untouched.
/// Computation order matters — the three scores are recomputed first, the
/// ease rating blends those *new* scores, and only the attempts-growth step
/// reads the *previous* ease rating.
///
/// # Examples
///
/// ```
/// # use drill_core::mastery;
/// # use drill_core::model::{Answer, ProgressRecord, QuestionId, RecordId};
/// let record = ProgressRecord::new(
///     RecordId::generate(),
///     QuestionId::generate(),
///     "math",
///     vec!["algebra".into()],
/// );
/// let updated = mastery::apply_answer(&record, Answer::Correct);
///
/// assert_eq!(updated.correct_count, 1);
/// assert_eq!(updated.long_term_score, 100);
/// assert_eq!(updated.total_attempts, 1);
/// ```
#[must_use]
pub fn apply_answer(record: &ProgressRecord, answer: Answer) -> ProgressRecord {
    let mut next = record.clone();

    match answer {
        Answer::Correct => next.correct_count += 1,
        Answer::Incorrect => next.wrong_count += 1,
    }

    next.long_term_score = long_term_score(next.correct_count, next.wrong_count);
    next.middle_term_score = middle_term_step(record.middle_term_score, answer);
    next.short_term_score = short_term_step(record.short_term_score, answer);
    next.easy_rating = easy_rating(
        next.long_term_score,
        next.middle_term_score,
        next.short_term_score,
    );
    next.total_attempts = next_attempt_count(record.total_attempts, record.easy_rating);

    next
}

/// Lifts a record past the maturity gate after it was drilled to mastery.
///
/// Scores are untouched — every answered attempt already updated them — but
/// the attempt counter jumps to at least `MATURITY_GATE + 1` so the question
/// stops resurfacing in the "new" pool.
#[must_use]
pub fn graduate(record: &ProgressRecord) -> ProgressRecord {
    let mut next = record.clone();
    next.total_attempts = next.total_attempts.max(MATURITY_GATE + 1);
    next
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, RecordId};

    fn build_record() -> ProgressRecord {
        ProgressRecord::new(
            RecordId::new("r1"),
            QuestionId::new("q1"),
            "math",
            vec!["algebra".into()],
        )
    }

    #[test]
    fn first_correct_answer_snapshot() {
        let updated = apply_answer(&build_record(), Answer::Correct);

        assert_eq!(updated.correct_count, 1);
        assert_eq!(updated.wrong_count, 0);
        assert_eq!(updated.long_term_score, 100);
        assert_eq!(updated.middle_term_score, 10);
        assert_eq!(updated.short_term_score, 30);
        assert_eq!(updated.easy_rating, 40);
        assert_eq!(updated.total_attempts, 1);
    }

    #[test]
    fn first_wrong_answer_stays_floored() {
        let updated = apply_answer(&build_record(), Answer::Incorrect);

        assert_eq!(updated.wrong_count, 1);
        assert_eq!(updated.long_term_score, 0);
        assert_eq!(updated.middle_term_score, 0);
        assert_eq!(updated.short_term_score, 0);
        assert_eq!(updated.easy_rating, 0);
        assert_eq!(updated.total_attempts, 1);
    }

    #[test]
    fn long_term_score_is_exact_floored_ratio() {
        assert_eq!(long_term_score(2, 1), 66);
        assert_eq!(long_term_score(1, 2), 33);
        assert_eq!(long_term_score(1, 1), 50);
        assert_eq!(long_term_score(0, 5), 0);
        assert_eq!(long_term_score(5, 0), 100);
        assert_eq!(long_term_score(0, 0), 0);
    }

    #[test]
    fn middle_term_boundaries() {
        assert_eq!(middle_term_step(0, Answer::Incorrect), 0);
        assert_eq!(middle_term_step(0, Answer::Correct), 10);
        assert_eq!(middle_term_step(100, Answer::Correct), 100);
        assert_eq!(middle_term_step(100, Answer::Incorrect), 90);
    }

    #[test]
    fn middle_term_interior_steps_by_ten() {
        assert_eq!(middle_term_step(50, Answer::Correct), 60);
        assert_eq!(middle_term_step(50, Answer::Incorrect), 40);
        assert_eq!(middle_term_step(10, Answer::Incorrect), 0);
        assert_eq!(middle_term_step(90, Answer::Correct), 100);
    }

    #[test]
    fn middle_term_negative_seed_uses_floor_rule() {
        assert_eq!(middle_term_step(-5, Answer::Correct), 10);
        assert_eq!(middle_term_step(-5, Answer::Incorrect), 0);
    }

    #[test]
    fn short_term_boundaries() {
        assert_eq!(short_term_step(0, Answer::Incorrect), 0);
        assert_eq!(short_term_step(0, Answer::Correct), 30);
        assert_eq!(short_term_step(100, Answer::Correct), 100);
        assert_eq!(short_term_step(100, Answer::Incorrect), 70);
    }

    #[test]
    fn short_term_interior_overshoot_is_clamped() {
        assert_eq!(short_term_step(90, Answer::Correct), 100);
        assert_eq!(short_term_step(20, Answer::Incorrect), 0);
        assert_eq!(short_term_step(50, Answer::Correct), 80);
        assert_eq!(short_term_step(50, Answer::Incorrect), 20);
    }

    #[test]
    fn easy_rating_blends_and_floors() {
        assert_eq!(easy_rating(100, 10, 30), 40);
        assert_eq!(easy_rating(100, 100, 100), 100);
        assert_eq!(easy_rating(0, 0, 0), 0);
        assert_eq!(easy_rating(33, 40, 60), 46);
    }

    #[test]
    fn attempts_grow_linearly_up_to_the_gate() {
        assert_eq!(next_attempt_count(0, 3), 1);
        assert_eq!(next_attempt_count(9, 95), 10);
        assert_eq!(next_attempt_count(10, 95), 11);
    }

    #[test]
    fn attempts_grow_by_ease_past_the_gate() {
        assert_eq!(next_attempt_count(11, 45), 15);
        assert_eq!(next_attempt_count(11, 9), 11);
        assert_eq!(next_attempt_count(20, 100), 30);
    }

    #[test]
    fn attempts_never_decrease_on_negative_ease() {
        assert_eq!(next_attempt_count(12, -20), 12);
    }

    #[test]
    fn attempts_growth_reads_previous_ease_not_new() {
        let mut record = build_record();
        record.correct_count = 5;
        record.wrong_count = 5;
        record.total_attempts = 11;
        record.long_term_score = 50;
        record.middle_term_score = 50;
        record.short_term_score = 50;
        record.easy_rating = 45;

        let updated = apply_answer(&record, Answer::Correct);

        // Growth comes from the stored ease (45 -> +4), not the fresh blend.
        assert_eq!(updated.total_attempts, 15);
        assert_eq!(updated.easy_rating, 66);
    }

    #[test]
    fn repeated_updates_never_decrease_attempts() {
        let once = apply_answer(&build_record(), Answer::Incorrect);
        let twice = apply_answer(&once, Answer::Incorrect);
        assert!(twice.total_attempts >= once.total_attempts);

        let mut mature = build_record();
        mature.total_attempts = 15;
        mature.easy_rating = 0;
        let updated = apply_answer(&mature, Answer::Incorrect);
        assert!(updated.total_attempts >= mature.total_attempts);
    }

    #[test]
    fn scores_stay_in_range_over_mixed_sequences() {
        let mut record = build_record();
        for i in 0..40 {
            let answer = Answer::from_correct(i % 3 != 0);
            record = apply_answer(&record, answer);

            assert!((0..=100).contains(&record.long_term_score));
            assert!((0..=100).contains(&record.middle_term_score));
            assert!((0..=100).contains(&record.short_term_score));
            assert!((0..=100).contains(&record.easy_rating));
        }
        assert_eq!(record.correct_count + record.wrong_count, 40);
    }

    #[test]
    fn apply_answer_leaves_identity_fields_alone() {
        let record = build_record();
        let updated = apply_answer(&record, Answer::Correct);

        assert_eq!(updated.id, record.id);
        assert_eq!(updated.question_id, record.question_id);
        assert_eq!(updated.subject, record.subject);
        assert_eq!(updated.tags, record.tags);
    }

    #[test]
    fn graduate_lifts_new_records_past_the_gate() {
        let record = build_record();
        let graduated = graduate(&record);
        assert_eq!(graduated.total_attempts, MATURITY_GATE + 1);
        assert!(graduated.is_mature());
    }

    #[test]
    fn graduate_keeps_already_mature_records() {
        let mut record = build_record();
        record.total_attempts = 25;
        let graduated = graduate(&record);
        assert_eq!(graduated.total_attempts, 25);
    }

    #[test]
    fn graduate_leaves_scores_alone() {
        let mut record = build_record();
        record.short_term_score = 60;
        record.easy_rating = 55;
        let graduated = graduate(&record);
        assert_eq!(graduated.short_term_score, 60);
        assert_eq!(graduated.easy_rating, 55);
    }
}
