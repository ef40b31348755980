use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("canonical answer cannot be empty")]
    EmptyAnswer,

    #[error("question must have at least one acceptable answer")]
    NoAcceptableAnswers,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank cannot be empty")]
    Empty,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single quiz item: an image to identify plus the set of answers accepted
/// for it.
///
/// The image reference is an opaque handle (URL or asset path) resolved by the
/// presentation layer; the core never interprets it. Acceptable answers are
/// matched case-insensitively after trimming, with exact string equality only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    image: String,
    canonical_answer: String,
    acceptable_answers: Vec<String>,
}

/// Normalizes a guess or acceptable answer for comparison.
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl Question {
    /// Create a question, validating its answer set.
    ///
    /// The lowercase canonical form is added to the acceptable set if it is
    /// not already covered, so a bare canonical answer always matches.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyAnswer` if the canonical answer is blank,
    /// or `QuestionError::NoAcceptableAnswers` if the acceptable set is empty.
    pub fn new(
        id: QuestionId,
        image: impl Into<String>,
        canonical_answer: impl Into<String>,
        acceptable_answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let canonical_answer = canonical_answer.into().trim().to_string();
        if canonical_answer.is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        if acceptable_answers.is_empty() {
            return Err(QuestionError::NoAcceptableAnswers);
        }

        let mut acceptable_answers = acceptable_answers;
        let canonical_lower = canonical_answer.to_lowercase();
        if !acceptable_answers
            .iter()
            .any(|a| normalize(a) == canonical_lower)
        {
            acceptable_answers.push(canonical_lower);
        }

        Ok(Self {
            id,
            image: image.into(),
            canonical_answer,
            acceptable_answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub fn canonical_answer(&self) -> &str {
        &self.canonical_answer
    }

    #[must_use]
    pub fn acceptable_answers(&self) -> &[String] {
        &self.acceptable_answers
    }

    /// Returns true if the guess matches any acceptable answer.
    ///
    /// Matching is case-insensitive and whitespace-trimmed, with exact string
    /// equality against each entry. No fuzzy or substring matching.
    #[must_use]
    pub fn matches(&self, guess: &str) -> bool {
        let guess = normalize(guess);
        self.acceptable_answers.iter().any(|a| normalize(a) == guess)
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// A fixed, ordered catalog of questions for a session.
///
/// Immutable once constructed; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from an ordered list of questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: construction rejects empty banks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Index of the final question.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.questions.len() - 1
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
