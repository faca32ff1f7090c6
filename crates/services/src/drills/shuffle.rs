use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use drill_core::{Answer, Question, QuestionError};

/// Randomized presentation order for a question's options.
///
/// The shuffle permutes option *slots* (original indices), never option
/// texts, so two options with identical text stay distinguishable and the
/// correct answer always maps back to the slot it was authored in. The
/// question itself is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// `order[position]` is the original slot shown at `position`.
    order: Vec<usize>,
    correct_position: usize,
}

impl Presentation {
    /// Uniformly shuffled presentation using the thread-local generator.
    #[must_use]
    pub fn shuffled(question: &Question) -> Self {
        Self::shuffled_with(question, &mut rng())
    }

    /// Uniformly shuffled presentation using the supplied generator.
    ///
    /// Deterministic tests seed a `StdRng` and pass it here.
    #[must_use]
    pub fn shuffled_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..question.options().len()).collect();
        order.shuffle(rng);
        Self::from_order(question, order)
    }

    /// Presentation that shows the options in their stored order.
    #[must_use]
    pub fn unshuffled(question: &Question) -> Self {
        let order: Vec<usize> = (0..question.options().len()).collect();
        Self::from_order(question, order)
    }

    fn from_order(question: &Question, order: Vec<usize>) -> Self {
        // `order` is a permutation of 0..len, so every slot has exactly one
        // position; invert it instead of searching by option text.
        let mut positions = vec![0; order.len()];
        for (position, &slot) in order.iter().enumerate() {
            positions[slot] = position;
        }
        let correct_position = positions[question.correct_answer()];
        Self {
            order,
            correct_position,
        }
    }

    /// Original slots in presentation order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Position at which the correct option is shown.
    #[must_use]
    pub fn correct_position(&self) -> usize {
        self.correct_position
    }

    /// Original slot of the option shown at `position`, if in range.
    #[must_use]
    pub fn original_slot(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    /// The question's option texts in presentation order.
    #[must_use]
    pub fn options<'a>(&self, question: &'a Question) -> Vec<&'a str> {
        self.order
            .iter()
            .map(|&slot| question.options()[slot].as_str())
            .collect()
    }

    /// Grade a picked presentation position against the question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::ChoiceOutOfRange` when `position` does not
    /// address a shown option.
    pub fn grade(&self, question: &Question, position: usize) -> Result<Answer, QuestionError> {
        let slot = self
            .original_slot(position)
            .ok_or(QuestionError::ChoiceOutOfRange {
                provided: position,
                options: self.order.len(),
            })?;
        question.grade(slot)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
