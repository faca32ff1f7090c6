#![forbid(unsafe_code)]

//! Domain model and scoring engine for spaced-repetition multiple-choice
//! drilling.
//!
//! This crate is pure: no I/O, no clock, no store types. Persistence and
//! session orchestration live in the `storage` and `services` crates.

pub mod mastery;
pub mod model;

pub use mastery::{apply_answer, graduate};
pub use model::{
    Answer, DrillSettings, INITIAL_EASY_RATING, MATURITY_GATE, ProgressRecord, Question,
    QuestionDraft, QuestionError, QuestionId, RecordId, SettingsError, ValidatedQuestion,
};
