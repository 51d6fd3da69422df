//! # survey-intake
//!
//! Validate and store survey responses. Store-agnostic.
//!
//! The heart of this crate is [`submit_response`], which takes a proposed
//! answer set through a fixed sequence of gates and persists it atomically:
//!
//! 1. the survey exists and is active
//! 2. a known respondent has not answered it before
//! 3. the answers are a well-formed list
//! 4. every answer passes [`validate_answers`]
//! 5. the store commits the response and all answers in one transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use survey_intake::{AnswerSet, MemoryStore, ProposedAnswer, SubmissionRequest, submit_response};
//!
//! let request = SubmissionRequest::new(survey_id, vec![
//!     ProposedAnswer::new(question_id, "Yes"),
//! ])
//! .by(user_id);
//!
//! let submitted = submit_response(&store, request).await?;
//! println!("{} ({})", submitted.message, submitted.response.record.id);
//! ```
//!
//! ## Stores
//!
//! Stores implement `SurveyCatalog` and `ResponseStore`:
//! - [`MemoryStore`] - in-process, for tests and demos
//! - `survey-intake-postgres` - PostgreSQL via deadpool

// Re-export all types from survey-intake-types
pub use survey_intake_types::*;

mod validate;
pub use validate::{check_answer, validate_answers};

mod submit;
pub use submit::{
    SUBMITTED_MESSAGE, SubmissionRequest, SubmissionStage, SubmittedResponse, submit_response,
};

mod responses;
pub use responses::{
    ListOptions, SurveyResponseListing, SurveyResponses, delete_response, get_response,
    list_survey_responses, my_responses,
};

// In-memory store for testing the pipeline without a database
mod memory_store;
pub use memory_store::MemoryStore;
