use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{QuestionId, ValidationError};

/// A raw answer value as submitted by a respondent.
///
/// Everything is stored as text; this only decides which JSON shapes are
/// accepted before validation. Objects and arrays are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// A string value (any question type).
    Text(String),

    /// A whole number, typically a rating.
    Integer(i64),

    /// A non-integral number.
    Float(f64),

    /// A JSON boolean, typically for boolean questions.
    Bool(bool),
}

impl AnswerValue {
    /// Render the value as the text that would be stored.
    pub fn to_answer_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AnswerValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One entry of a submission: a question and the respondent's answer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAnswer {
    pub question_id: QuestionId,

    /// Absent and `null` both count as an empty answer.
    #[serde(default)]
    pub answer_text: Option<AnswerValue>,
}

impl ProposedAnswer {
    /// Create an answer with the given text.
    pub fn new(question_id: QuestionId, answer_text: impl Into<AnswerValue>) -> Self {
        Self {
            question_id,
            answer_text: Some(answer_text.into()),
        }
    }

    /// Create an entry with no answer value at all.
    pub fn blank(question_id: QuestionId) -> Self {
        Self {
            question_id,
            answer_text: None,
        }
    }

    /// The answer coerced to text; missing values become the empty string.
    pub fn text(&self) -> String {
        self.answer_text
            .as_ref()
            .map(AnswerValue::to_answer_text)
            .unwrap_or_default()
    }
}

/// The `answers` field of a submission, classified by shape.
///
/// Built from untrusted JSON so that malformed input is rejected with a
/// precise reason instead of reaching the validator.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSet {
    /// No `answers` field, or `null`.
    Missing,

    /// `answers` is present but not an array.
    NotAList,

    /// An array entry is not a `{question_id, answer_text}` object.
    MalformedEntry { index: usize },

    /// A well-formed list of entries.
    Entries(Vec<ProposedAnswer>),
}

impl AnswerSet {
    /// Classify the raw `answers` value of a request body.
    pub fn from_json(value: Option<Value>) -> Self {
        let items = match value {
            None | Some(Value::Null) => return Self::Missing,
            Some(Value::Array(items)) => items,
            Some(_) => return Self::NotAList,
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<ProposedAnswer>(item) {
                Ok(entry) => entries.push(entry),
                Err(_) => return Self::MalformedEntry { index },
            }
        }
        Self::Entries(entries)
    }

    /// Get the entries, or the shape rejection.
    pub fn into_entries(self) -> Result<Vec<ProposedAnswer>, ValidationError> {
        match self {
            Self::Missing => Err(ValidationError::AnswersMissing),
            Self::NotAList => Err(ValidationError::AnswersNotAList),
            Self::MalformedEntry { index } => Err(ValidationError::MalformedAnswer { index }),
            Self::Entries(entries) => Ok(entries),
        }
    }
}

impl From<Vec<ProposedAnswer>> for AnswerSet {
    fn from(entries: Vec<ProposedAnswer>) -> Self {
        Self::Entries(entries)
    }
}

/// An answer that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedAnswer {
    pub question_id: QuestionId,
    pub answer_text: String,
}
