mod ids;
mod progress;
mod question;
mod settings;

pub use ids::{ParseIdError, QuestionId, RecordId};
pub use progress::{Answer, INITIAL_EASY_RATING, MATURITY_GATE, ProgressRecord};
pub use question::{Question, QuestionDraft, QuestionError, ValidatedQuestion};
pub use settings::{DrillSettings, SettingsError};
