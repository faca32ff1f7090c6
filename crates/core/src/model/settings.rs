use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("mastery streak must be > 0")]
    InvalidMasteryStreak,

    #[error("at least one of the new/old quotas must be > 0")]
    NoQuota,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Configuration for one drill: how many new and mature questions to pull,
/// and how many consecutive correct answers retire a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillSettings {
    new_limit: u32,
    old_limit: u32,
    mastery_streak: u32,
}

impl DrillSettings {
    /// Creates custom drill settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMasteryStreak` if the streak is zero,
    /// or `SettingsError::NoQuota` if both quotas are zero.
    pub fn new(new_limit: u32, old_limit: u32, mastery_streak: u32) -> Result<Self, SettingsError> {
        if mastery_streak == 0 {
            return Err(SettingsError::InvalidMasteryStreak);
        }
        if new_limit == 0 && old_limit == 0 {
            return Err(SettingsError::NoQuota);
        }

        Ok(Self {
            new_limit,
            old_limit,
            mastery_streak,
        })
    }

    /// Creates the balanced default mix: 10 new, 10 mature, streak of 3.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            new_limit: 10,
            old_limit: 10,
            mastery_streak: 3,
        }
    }

    // Accessors
    #[must_use]
    pub fn new_limit(&self) -> u32 {
        self.new_limit
    }

    #[must_use]
    pub fn old_limit(&self) -> u32 {
        self.old_limit
    }

    #[must_use]
    pub fn mastery_streak(&self) -> u32 {
        self.mastery_streak
    }
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self::balanced()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
