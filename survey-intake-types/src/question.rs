use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{QuestionId, SurveyId};

/// Lowest accepted rating.
pub const RATING_MIN: i64 = 1;

/// Highest accepted rating.
pub const RATING_MAX: i64 = 10;

/// Accepted spellings for a boolean answer, compared case-insensitively.
pub const BOOLEAN_LITERALS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];

/// Error type for building questions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
    #[error("Unknown question type: {0}")]
    UnknownType(String),

    #[error("A {question_type} question needs at least two options, got {count}")]
    TooFewOptions {
        question_type: QuestionType,
        count: usize,
    },
}

/// The flat name of a question type, as stored and sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    SingleChoice,
    MultipleChoice,
    Rating,
    Boolean,
}

impl QuestionType {
    /// Get the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Rating => "rating",
            Self::Boolean => "boolean",
        }
    }

    /// Check if questions of this type carry an option set.
    pub fn requires_options(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "single_choice" => Ok(Self::SingleChoice),
            "multiple_choice" => Ok(Self::MultipleChoice),
            "rating" => Ok(Self::Rating),
            "boolean" => Ok(Self::Boolean),
            other => Err(QuestionError::UnknownType(other.to_string())),
        }
    }
}

/// The option set of a choice question. Always holds at least two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChoiceOptions(Vec<String>);

impl ChoiceOptions {
    /// Create an option set, rejecting fewer than two entries.
    pub fn new<I, S>(options: I) -> Result<Self, QuestionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                question_type: QuestionType::SingleChoice,
                count: options.len(),
            });
        }
        Ok(Self(options))
    }

    /// Check for an exact match against one of the options.
    pub fn contains(&self, candidate: &str) -> bool {
        self.0.iter().any(|option| option == candidate)
    }

    /// Get the options in their configured order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Get the number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed option set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for ChoiceOptions {
    type Error = QuestionError;

    fn try_from(options: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl From<ChoiceOptions> for Vec<String> {
    fn from(options: ChoiceOptions) -> Self {
        options.0
    }
}

/// The kind of question, determining how an answer's text is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Free text; only the required check applies.
    Text,

    /// Exactly one of the options, matched verbatim.
    SingleChoice(ChoiceOptions),

    /// Comma-separated options, each matched after trimming.
    MultipleChoice(ChoiceOptions),

    /// An integer between `RATING_MIN` and `RATING_MAX`.
    Rating,

    /// One of `BOOLEAN_LITERALS`.
    Boolean,
}

impl QuestionKind {
    /// Rebuild a kind from its stored columns.
    ///
    /// Options are ignored for types that do not use them.
    pub fn from_parts(
        question_type: QuestionType,
        options: Option<Vec<String>>,
    ) -> Result<Self, QuestionError> {
        let choices = || {
            let options = options.clone().unwrap_or_default();
            ChoiceOptions::new(options).map_err(|err| match err {
                QuestionError::TooFewOptions { count, .. } => QuestionError::TooFewOptions {
                    question_type,
                    count,
                },
                other => other,
            })
        };

        Ok(match question_type {
            QuestionType::Text => Self::Text,
            QuestionType::SingleChoice => Self::SingleChoice(choices()?),
            QuestionType::MultipleChoice => Self::MultipleChoice(choices()?),
            QuestionType::Rating => Self::Rating,
            QuestionType::Boolean => Self::Boolean,
        })
    }

    /// Get the flat type name.
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::Text => QuestionType::Text,
            Self::SingleChoice(_) => QuestionType::SingleChoice,
            Self::MultipleChoice(_) => QuestionType::MultipleChoice,
            Self::Rating => QuestionType::Rating,
            Self::Boolean => QuestionType::Boolean,
        }
    }

    /// Get the option set, for choice kinds.
    pub fn options(&self) -> Option<&ChoiceOptions> {
        match self {
            Self::SingleChoice(options) | Self::MultipleChoice(options) => Some(options),
            _ => None,
        }
    }
}

/// A single question in a survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    survey_id: SurveyId,

    /// The prompt text, also used in rejection messages.
    text: String,

    kind: QuestionKind,
    required: bool,

    /// Ordering key within the survey.
    position: i32,
}

impl Question {
    /// Create a new optional question at position 0.
    pub fn new(
        id: QuestionId,
        survey_id: SurveyId,
        text: impl Into<String>,
        kind: QuestionKind,
    ) -> Self {
        Self {
            id,
            survey_id,
            text: text.into(),
            kind,
            required: false,
            position: 0,
        }
    }

    /// Set whether an answer is mandatory.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the ordering key.
    pub fn at_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn survey_id(&self) -> SurveyId {
        self.survey_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip_through_from_str() {
        for ty in [
            QuestionType::Text,
            QuestionType::SingleChoice,
            QuestionType::MultipleChoice,
            QuestionType::Rating,
            QuestionType::Boolean,
        ] {
            assert_eq!(ty.as_str().parse::<QuestionType>().unwrap(), ty);
        }
        assert!(matches!(
            "dropdown".parse::<QuestionType>(),
            Err(QuestionError::UnknownType(_))
        ));
    }

    #[test]
    fn choice_options_need_two_entries() {
        assert!(ChoiceOptions::new(["Yes", "No"]).is_ok());
        assert_eq!(
            ChoiceOptions::new(["Only"]),
            Err(QuestionError::TooFewOptions {
                question_type: QuestionType::SingleChoice,
                count: 1,
            })
        );
    }

    #[test]
    fn from_parts_reports_the_actual_type() {
        let err = QuestionKind::from_parts(QuestionType::MultipleChoice, None).unwrap_err();
        assert_eq!(
            err,
            QuestionError::TooFewOptions {
                question_type: QuestionType::MultipleChoice,
                count: 0,
            }
        );
    }

    #[test]
    fn from_parts_ignores_options_on_plain_types() {
        let kind =
            QuestionKind::from_parts(QuestionType::Rating, Some(vec!["x".to_string()])).unwrap();
        assert_eq!(kind, QuestionKind::Rating);
        assert!(kind.options().is_none());
    }

    #[test]
    fn choice_options_reject_short_lists_when_deserialized() {
        let ok: ChoiceOptions = serde_json::from_str(r#"["A","B","C"]"#).unwrap();
        assert!(ok.contains("B"));
        assert!(!ok.contains("b"));
        assert!(serde_json::from_str::<ChoiceOptions>(r#"["A"]"#).is_err());
    }
}
