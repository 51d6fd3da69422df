use crate::{QuestionId, ResponseId, SurveyId, UserId};

/// Coarse classification of every failure the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The survey or response does not exist.
    NotFound,

    /// The caller may not perform the operation (inactive survey, duplicate
    /// submission, not the owner).
    Forbidden,

    /// The submitted answers break a rule.
    InvalidInput,

    /// The store failed; nothing was written.
    StorageFailure,
}

impl ErrorKind {
    /// Only storage failures may succeed on a retry of the same input.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::StorageFailure)
    }
}

/// A rule violated by a proposed answer set.
///
/// Messages name the offending question where there is one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Answers array is required")]
    AnswersMissing,

    #[error("Answers must be an array")]
    AnswersNotAList,

    #[error("Each answer must have a valid question_id (entry {index})")]
    MalformedAnswer { index: usize },

    #[error("Question {question_id} does not belong to this survey")]
    UnknownQuestion { question_id: QuestionId },

    #[error("Duplicate answer for question {question_id}")]
    DuplicateAnswer { question_id: QuestionId },

    #[error("Question \"{question_text}\" is required")]
    RequiredAnswerEmpty {
        question_id: QuestionId,
        question_text: String,
    },

    #[error("Invalid option for question \"{question_text}\"")]
    InvalidOption {
        question_id: QuestionId,
        question_text: String,
    },

    #[error("Invalid option \"{option}\" for question \"{question_text}\"")]
    InvalidOptions {
        question_id: QuestionId,
        question_text: String,
        option: String,
    },

    #[error("Rating must be a number between 1 and 10 for question \"{question_text}\"")]
    InvalidRating {
        question_id: QuestionId,
        question_text: String,
    },

    #[error("Boolean answer required for question \"{question_text}\"")]
    InvalidBoolean {
        question_id: QuestionId,
        question_text: String,
    },

    #[error("Required question \"{question_text}\" was not answered")]
    RequiredQuestionUnanswered {
        question_id: QuestionId,
        question_text: String,
    },
}

impl ValidationError {
    /// The question the rule was checked against, if any.
    pub fn question_id(&self) -> Option<QuestionId> {
        match self {
            Self::AnswersMissing | Self::AnswersNotAList | Self::MalformedAnswer { .. } => None,
            Self::UnknownQuestion { question_id }
            | Self::DuplicateAnswer { question_id }
            | Self::RequiredAnswerEmpty { question_id, .. }
            | Self::InvalidOption { question_id, .. }
            | Self::InvalidOptions { question_id, .. }
            | Self::InvalidRating { question_id, .. }
            | Self::InvalidBoolean { question_id, .. }
            | Self::RequiredQuestionUnanswered { question_id, .. } => Some(*question_id),
        }
    }
}

/// Error type for store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. a second response by
    /// the same respondent). The transaction was rolled back.
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),

    /// Backend-specific failure (connection loss, bad row, etc.)
    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a backend error from any error type.
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::Backend(err.into())
    }

    /// Check if this error is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Error type for submitting a response.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Survey not found")]
    SurveyNotFound(SurveyId),

    #[error("This survey is not currently accepting responses")]
    SurveyInactive(SurveyId),

    #[error("You have already submitted a response to this survey")]
    AlreadyResponded {
        survey_id: SurveyId,
        respondent_id: UserId,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The store failed. The message leaves out the cause.
    #[error("Failed to submit response")]
    Storage(#[from] StoreError),
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SurveyNotFound(_) => ErrorKind::NotFound,
            Self::SurveyInactive(_) | Self::AlreadyResponded { .. } => ErrorKind::Forbidden,
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Error type for reading and deleting stored responses.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Response not found")]
    ResponseNotFound(ResponseId),

    /// The viewer is neither the owner nor, where allowed, the respondent.
    #[error("You do not have permission to {action}")]
    Forbidden { action: &'static str },

    #[error("Storage failure")]
    Storage(#[from] StoreError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResponseNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_question() {
        let err = ValidationError::InvalidOptions {
            question_id: QuestionId::new(4),
            question_text: "Pick letters".to_string(),
            option: "D".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid option \"D\" for question \"Pick letters\""
        );
        assert_eq!(err.question_id(), Some(QuestionId::new(4)));
    }

    #[test]
    fn storage_message_hides_the_cause() {
        let err = SubmissionError::from(StoreError::backend(anyhow::anyhow!(
            "connection reset by peer at 10.0.0.3"
        )));
        assert_eq!(err.to_string(), "Failed to submit response");
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn only_storage_failures_are_retryable() {
        assert!(!SubmissionError::SurveyNotFound(SurveyId::new(1)).kind().is_retryable());
        assert!(
            !SubmissionError::from(ValidationError::AnswersMissing)
                .kind()
                .is_retryable()
        );
        assert_eq!(
            QueryError::Forbidden {
                action: "delete this response"
            }
            .kind(),
            ErrorKind::Forbidden
        );
    }
}
