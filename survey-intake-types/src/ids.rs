use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Error returned when text is not a positive integer identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{input}' is not a valid identifier")]
pub struct ParseIdError {
    input: String,
}

impl ParseIdError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier as assigned by the store.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            /// Only positive integers are identifiers.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(ParseIdError {
                        input: s.to_string(),
                    }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifies a survey.
    SurveyId
);

define_id!(
    /// Identifies a question within a survey.
    QuestionId
);

define_id!(
    /// Identifies a submitted response.
    ResponseId
);

define_id!(
    /// Identifies a single stored answer.
    AnswerId
);

define_id!(
    /// Identifies an authenticated user (survey owner or respondent).
    UserId
);
