mod plan;
mod practice;
mod queries;
mod session;
mod shuffle;
mod workflow;

// Public API of the drill subsystem.
pub use crate::error::{DrillError, PracticeError};
pub use plan::{DrillPlan, new_share_of_total, old_backfill};
pub use practice::{PracticeService, PracticeSession, PracticeStep, PracticeSummary};
pub use session::{AdvanceOutcome, AnswerFeedback, DrillEntry, DrillPhase, DrillSession};
pub use shuffle::Presentation;
pub use workflow::{AnswerOutcome, DrillLoopService};
