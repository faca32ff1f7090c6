#![forbid(unsafe_code)]

//! Drill orchestration over the storage boundary: selection planning,
//! option shuffling, the mastery drill loop, the timed practice flow, and
//! question ingestion.

pub mod drills;
pub mod error;
pub mod progress;
pub mod questions;

pub use error::{DrillError, PracticeError, ProgressServiceError, QuestionServiceError};
pub use progress::ProgressService;
pub use questions::{IngestedQuestion, QuestionService};

pub use drills::{
    AdvanceOutcome, AnswerFeedback, AnswerOutcome, DrillEntry, DrillLoopService, DrillPhase,
    DrillPlan, DrillSession, PracticeService, PracticeSession, PracticeStep, PracticeSummary,
    Presentation,
};
