use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::progress::Answer;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least 2 options, got {provided}")]
    TooFewOptions { provided: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("correct answer index {provided} out of range for {options} options")]
    CorrectAnswerOutOfRange { provided: usize, options: usize },

    #[error("question subject cannot be empty")]
    EmptySubject,

    #[error("choice index {provided} out of range for {options} options")]
    ChoiceOutOfRange { provided: usize, options: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question input, as received from an import or an authoring
/// surface. Turn it into a [`Question`] via [`QuestionDraft::validate`]
/// followed by [`ValidatedQuestion::assign_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    subject: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
            subject: subject.into(),
        }
    }

    /// Checks the draft's content invariants.
    ///
    /// Option texts are kept verbatim — duplicates are legal and presentation
    /// shuffling must therefore track options by slot, not by text.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionError` if the prompt or subject is blank, fewer
    /// than two options are given, an option is blank, or the correct-answer
    /// index does not address an option.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                provided: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::BlankOption { index });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                provided: self.correct_answer,
                options: self.options.len(),
            });
        }
        if self.subject.trim().is_empty() {
            return Err(QuestionError::EmptySubject);
        }

        Ok(ValidatedQuestion {
            prompt: self.prompt.trim().to_owned(),
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            subject: self.subject.trim().to_owned(),
        })
    }
}

/// A draft that passed validation and is waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    subject: String,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            prompt: self.prompt,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            subject: self.subject,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question: prompt, ordered options, the index of the
/// correct option, an explanation shown after answering, and a subject label.
///
/// Content is immutable once created; presentation order is a session
/// concern and never mutates the stored option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    subject: String,
}

impl Question {
    /// Rebuilds a question from stored fields, re-checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionError` if the stored fields violate any draft
    /// invariant (blank prompt/subject/option, too few options, or an
    /// out-of-range correct-answer index).
    pub fn from_persisted(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let validated = QuestionDraft::new(prompt, options, correct_answer, explanation, subject)
            .validate()?;
        Ok(validated.assign_id(id))
    }

    /// Grades a picked option index against the stored correct answer.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::ChoiceOutOfRange` if `choice` does not address
    /// an option.
    pub fn grade(&self, choice: usize) -> Result<Answer, QuestionError> {
        if choice >= self.options.len() {
            return Err(QuestionError::ChoiceOutOfRange {
                provided: choice,
                options: self.options.len(),
            });
        }
        Ok(Answer::from_correct(choice == self.correct_answer))
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_draft() -> QuestionDraft {
        QuestionDraft::new(
            "What is 2 + 2?",
            vec!["3".into(), "4".into(), "5".into()],
            1,
            "Basic addition.",
            "math",
        )
    }

    #[test]
    fn draft_validate_happy_path() {
        let question = build_draft()
            .validate()
            .unwrap()
            .assign_id(QuestionId::new("q1"));

        assert_eq!(question.id(), &QuestionId::new("q1"));
        assert_eq!(question.prompt(), "What is 2 + 2?");
        assert_eq!(question.options().len(), 3);
        assert_eq!(question.correct_answer(), 1);
        assert_eq!(question.subject(), "math");
    }

    #[test]
    fn draft_rejects_empty_prompt() {
        let err = QuestionDraft::new("   ", vec!["a".into(), "b".into()], 0, "", "math")
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn draft_rejects_single_option() {
        let err = QuestionDraft::new("Q", vec!["only".into()], 0, "", "math")
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { provided: 1 });
    }

    #[test]
    fn draft_rejects_blank_option() {
        let err = QuestionDraft::new("Q", vec!["a".into(), "  ".into()], 0, "", "math")
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::BlankOption { index: 1 });
    }

    #[test]
    fn draft_rejects_out_of_range_correct_answer() {
        let err = QuestionDraft::new("Q", vec!["a".into(), "b".into()], 2, "", "math")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectAnswerOutOfRange {
                provided: 2,
                options: 2
            }
        );
    }

    #[test]
    fn draft_rejects_blank_subject() {
        let err = QuestionDraft::new("Q", vec!["a".into(), "b".into()], 0, "", " ")
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptySubject);
    }

    #[test]
    fn draft_allows_duplicate_option_texts() {
        let question = QuestionDraft::new(
            "Pick the right 'same'",
            vec!["same".into(), "same".into(), "other".into()],
            1,
            "",
            "quirks",
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new("q-dup"));

        assert_eq!(question.options()[0], question.options()[1]);
        assert_eq!(question.correct_answer(), 1);
    }

    #[test]
    fn draft_trims_prompt_and_subject() {
        let question = QuestionDraft::new(
            "  Q  ",
            vec!["a".into(), "b".into()],
            0,
            "",
            "  math  ",
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new("q1"));

        assert_eq!(question.prompt(), "Q");
        assert_eq!(question.subject(), "math");
    }

    #[test]
    fn grade_marks_correct_and_incorrect() {
        let question = build_draft()
            .validate()
            .unwrap()
            .assign_id(QuestionId::new("q1"));

        assert_eq!(question.grade(1).unwrap(), Answer::Correct);
        assert_eq!(question.grade(0).unwrap(), Answer::Incorrect);
    }

    #[test]
    fn grade_rejects_out_of_range_choice() {
        let question = build_draft()
            .validate()
            .unwrap()
            .assign_id(QuestionId::new("q1"));

        let err = question.grade(3).unwrap_err();
        assert_eq!(
            err,
            QuestionError::ChoiceOutOfRange {
                provided: 3,
                options: 3
            }
        );
    }

    #[test]
    fn from_persisted_revalidates() {
        let err = Question::from_persisted(
            QuestionId::new("q1"),
            "Q",
            vec!["a".into(), "b".into()],
            5,
            "",
            "math",
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectAnswerOutOfRange {
                provided: 5,
                options: 2
            }
        );
    }
}
