//! Core types for the survey-intake crate.
//!
//! This crate provides the foundational types for collecting survey responses:
//! - `Survey`, `Question` and `QuestionKind` - What is being answered
//! - `ProposedAnswer` and `AnswerSet` - What a respondent submits
//! - `ResponseRecord`, `Answer` and friends - What gets stored
//! - `SurveyCatalog` and `ResponseStore` traits - For implementing store backends

mod ids;
pub use ids::{AnswerId, ParseIdError, QuestionId, ResponseId, SurveyId, UserId};

mod survey;
pub use survey::Survey;

mod question;
pub use question::{
    BOOLEAN_LITERALS, ChoiceOptions, Question, QuestionError, QuestionKind, QuestionType,
    RATING_MAX, RATING_MIN,
};

mod answer;
pub use answer::{AnswerSet, AnswerValue, ProposedAnswer, ValidatedAnswer};

mod response;
pub use response::{
    Answer, DetailedAnswer, DetailedResponse, NewResponse, Page, ResponseRecord, ResponseStats,
    ResponseWithAnswers,
};

mod error;
pub use error::{ErrorKind, QueryError, StoreError, SubmissionError, ValidationError};

mod store;
pub use store::{ResponseStore, SurveyCatalog, SurveyStore};
