use std::fmt;

use drill_core::{Answer, DrillSettings, ProgressRecord, Question, QuestionId};

use super::shuffle::Presentation;
use crate::error::DrillError;

//
// ─── WORKING-SET ENTRY ─────────────────────────────────────────────────────────
//

/// One question in the drill working set, paired with its progress record
/// and the presentation order its options are currently shown in.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillEntry {
    question: Question,
    record: ProgressRecord,
    presentation: Presentation,
}

impl DrillEntry {
    /// Pair a question with its record and shuffle the first presentation.
    #[must_use]
    pub fn new(question: Question, record: ProgressRecord) -> Self {
        let presentation = Presentation::shuffled(&question);
        Self {
            question,
            record,
            presentation,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Option texts in the order they are currently shown.
    #[must_use]
    pub fn options(&self) -> Vec<&str> {
        self.presentation.options(&self.question)
    }

    /// Grade a picked presentation position.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::ChoiceOutOfRange` for positions that do not
    /// address a shown option.
    pub fn grade(&self, position: usize) -> Result<Answer, drill_core::QuestionError> {
        self.presentation.grade(&self.question, position)
    }

    fn reshuffle(&mut self) {
        self.presentation = Presentation::shuffled(&self.question);
    }
}

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Lifecycle of a drill session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillPhase {
    /// Waiting for a working set; nothing can be answered yet.
    Configuring,
    /// Cycling the working set.
    Active,
    /// The working set emptied; only `restart` leaves this phase.
    Completed,
}

/// Feedback for one committed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub answer: Answer,
    /// Position at which the correct option was shown.
    pub correct_position: usize,
    /// Consecutive-correct streak of the question after this answer.
    pub streak: u32,
}

/// Result of advancing past an answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Questions evicted because their streak reached the mastery threshold.
    pub evicted: Vec<QuestionId>,
    /// True when a full pass ended without evictions and every presentation
    /// was reshuffled for the next pass.
    pub reshuffled: bool,
    pub is_complete: bool,
}

/// In-memory mastery drill over a working set of questions.
///
/// The session keeps cycling its questions, tracking a consecutive-correct
/// streak per question in an array parallel to the working set. On advance,
/// every question at the mastery streak is evicted; the session completes
/// when the set empties. All state is session-local — persistence is the
/// loop service's concern, and it commits to the store *before* mutating
/// the session.
pub struct DrillSession {
    settings: DrillSettings,
    phase: DrillPhase,
    entries: Vec<DrillEntry>,
    streaks: Vec<u32>,
    current: usize,
    answered: Option<Answer>,
    evictions_this_pass: usize,
}

impl DrillSession {
    /// Create an empty session in the `Configuring` phase.
    #[must_use]
    pub fn new(settings: DrillSettings) -> Self {
        Self {
            settings,
            phase: DrillPhase::Configuring,
            entries: Vec::new(),
            streaks: vec![0],
            current: 0,
            answered: None,
            evictions_this_pass: 0,
        }
    }

    /// Load the working set and enter the `Active` phase.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Empty` when `entries` is empty and
    /// `DrillError::AlreadyStarted` when the session left `Configuring`.
    pub fn begin(&mut self, entries: Vec<DrillEntry>) -> Result<(), DrillError> {
        if self.phase != DrillPhase::Configuring {
            return Err(DrillError::AlreadyStarted);
        }
        if entries.is_empty() {
            return Err(DrillError::Empty);
        }

        self.streaks = vec![0; entries.len()];
        self.entries = entries;
        self.current = 0;
        self.answered = None;
        self.evictions_this_pass = 0;
        self.phase = DrillPhase::Active;
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == DrillPhase::Completed
    }

    /// Number of questions still in the working set.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    /// Streaks parallel to the working set.
    #[must_use]
    pub fn streaks(&self) -> &[u32] {
        &self.streaks
    }

    /// The question currently presented, if the session is active.
    #[must_use]
    pub fn current(&self) -> Option<&DrillEntry> {
        if self.phase == DrillPhase::Active {
            self.entries.get(self.current)
        } else {
            None
        }
    }

    /// True once the current question was answered and the session is
    /// waiting for an advance.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answered.is_some()
    }

    /// How far the learner is through the current pass, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        match self.phase {
            DrillPhase::Configuring => 0.0,
            DrillPhase::Completed => 100.0,
            DrillPhase::Active => {
                (self.current + 1) as f64 / self.entries.len() as f64 * 100.0
            }
        }
    }

    /// Grade a picked position against the current question without
    /// committing anything.
    ///
    /// # Errors
    ///
    /// Phase guards (`NotActive`/`Completed`), `AlreadyAnswered` when the
    /// current question was already answered, and choice-range errors.
    pub fn grade_choice(&self, position: usize) -> Result<Answer, DrillError> {
        let entry = self.require_current()?;
        if self.answered.is_some() {
            return Err(DrillError::AlreadyAnswered);
        }
        Ok(entry.grade(position)?)
    }

    /// Commit an answer outcome: bump or reset the streak, optionally swap
    /// in the persisted record, and move to the `Answered` sub-state.
    ///
    /// # Errors
    ///
    /// Phase guards and `AlreadyAnswered`; see [`DrillSession::grade_choice`].
    pub fn commit_answer(
        &mut self,
        answer: Answer,
        updated_record: Option<ProgressRecord>,
    ) -> Result<AnswerFeedback, DrillError> {
        self.require_current()?;
        if self.answered.is_some() {
            return Err(DrillError::AlreadyAnswered);
        }

        if answer.is_correct() {
            self.streaks[self.current] += 1;
        } else {
            self.streaks[self.current] = 0;
        }
        if let Some(record) = updated_record {
            self.entries[self.current].record = record;
        }
        self.answered = Some(answer);

        Ok(AnswerFeedback {
            answer,
            correct_position: self.entries[self.current].presentation.correct_position(),
            streak: self.streaks[self.current],
        })
    }

    /// Grade and commit in one step, for callers that do not persist.
    ///
    /// # Errors
    ///
    /// Same as [`DrillSession::grade_choice`].
    pub fn answer_current(&mut self, position: usize) -> Result<AnswerFeedback, DrillError> {
        let answer = self.grade_choice(position)?;
        self.commit_answer(answer, None)
    }

    /// Questions that will be evicted by the next advance.
    ///
    /// The loop service reports these to the store before calling
    /// [`DrillSession::advance`], keeping the write ahead of the commit.
    ///
    /// # Errors
    ///
    /// Same guards as [`DrillSession::advance`].
    pub fn pending_evictions(&self) -> Result<Vec<QuestionId>, DrillError> {
        self.require_current()?;
        if self.answered.is_none() {
            return Err(DrillError::NotAnswered);
        }
        let threshold = self.settings.mastery_streak();
        Ok(self
            .entries
            .iter()
            .zip(&self.streaks)
            .filter(|&(_, &streak)| streak >= threshold)
            .map(|(entry, _)| entry.question.id().clone())
            .collect())
    }

    /// Advance past the answered question.
    ///
    /// Every question whose streak reached the mastery threshold leaves the
    /// working set. The position then moves to the next remaining question,
    /// wrapping to the front at the end of the set; a full pass without a
    /// single eviction reshuffles every presentation for the next pass.
    /// Emptying the set completes the session.
    ///
    /// # Errors
    ///
    /// Phase guards, plus `DrillError::NotAnswered` when the current
    /// question has not been answered yet.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, DrillError> {
        self.require_current()?;
        if self.answered.is_none() {
            return Err(DrillError::NotAnswered);
        }

        let threshold = self.settings.mastery_streak();
        let mut evicted = Vec::new();
        let mut current_evicted = false;
        let mut index = 0;
        while index < self.entries.len() {
            if self.streaks[index] >= threshold {
                evicted.push(self.entries[index].question.id().clone());
                self.entries.remove(index);
                self.streaks.remove(index);
                if index < self.current {
                    self.current -= 1;
                } else if index == self.current {
                    // The next remaining question shifts into this position.
                    current_evicted = true;
                }
            } else {
                index += 1;
            }
        }
        self.evictions_this_pass += evicted.len();
        self.answered = None;

        if self.entries.is_empty() {
            self.phase = DrillPhase::Completed;
            self.current = 0;
            return Ok(AdvanceOutcome {
                evicted,
                reshuffled: false,
                is_complete: true,
            });
        }

        if !current_evicted {
            self.current += 1;
        }
        let mut reshuffled = false;
        if self.current >= self.entries.len() {
            self.current = 0;
            if self.evictions_this_pass == 0 {
                for entry in &mut self.entries {
                    entry.reshuffle();
                }
                reshuffled = true;
            }
            self.evictions_this_pass = 0;
        }

        Ok(AdvanceOutcome {
            evicted,
            reshuffled,
            is_complete: false,
        })
    }

    /// Remove the current question immediately, mastery streak or not.
    ///
    /// Completes the session when the removed question was the last one.
    ///
    /// # Errors
    ///
    /// Phase guards only; deletion works in both the presented and the
    /// answered sub-state.
    pub fn delete_current(&mut self) -> Result<QuestionId, DrillError> {
        self.require_current()?;

        let entry = self.entries.remove(self.current);
        self.streaks.remove(self.current);
        self.answered = None;

        if self.entries.is_empty() {
            self.phase = DrillPhase::Completed;
            self.current = 0;
        } else if self.current >= self.entries.len() {
            self.current = 0;
        }

        Ok(entry.question.id().clone())
    }

    /// Drop all session-local state and return to `Configuring`.
    ///
    /// Persisted progress is untouched; only the working set, streaks, and
    /// position reset.
    pub fn restart(&mut self) {
        self.phase = DrillPhase::Configuring;
        self.entries.clear();
        self.streaks = vec![0];
        self.current = 0;
        self.answered = None;
        self.evictions_this_pass = 0;
    }

    fn require_current(&self) -> Result<&DrillEntry, DrillError> {
        match self.phase {
            DrillPhase::Configuring => Err(DrillError::NotActive),
            DrillPhase::Completed => Err(DrillError::Completed),
            DrillPhase::Active => self.entries.get(self.current).ok_or(DrillError::Completed),
        }
    }
}

impl fmt::Debug for DrillSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillSession")
            .field("phase", &self.phase)
            .field("entries_len", &self.entries.len())
            .field("current", &self.current)
            .field("answered", &self.answered)
            .field("streaks", &self.streaks)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
