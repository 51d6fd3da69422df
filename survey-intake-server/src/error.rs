use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use survey_intake::{ErrorKind, QueryError, SubmissionError};
use thiserror::Error;
use tracing::error;

use crate::routes::Envelope;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid user ID")]
    InvalidIdentity,

    #[error("Invalid survey ID")]
    InvalidSurveyId,

    #[error("Invalid response ID")]
    InvalidResponseId,

    #[error("Invalid pagination parameters")]
    InvalidPage,

    #[error("Malformed JSON body")]
    MalformedBody,

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// A query failure, with the message to show if the store failed.
    #[error("{source}")]
    Query {
        source: QueryError,
        failure: &'static str,
    },
}

impl ApiError {
    /// Wrap a query error; `failure` replaces the message of storage failures.
    pub fn query(failure: &'static str) -> impl FnOnce(QueryError) -> Self {
        move |source| Self::Query { source, failure }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidIdentity
            | Self::InvalidSurveyId
            | Self::InvalidResponseId
            | Self::InvalidPage
            | Self::MalformedBody => StatusCode::BAD_REQUEST,
            Self::Submission(SubmissionError::AlreadyResponded { .. }) => StatusCode::CONFLICT,
            Self::Submission(err) => kind_status(err.kind()),
            Self::Query { source, .. } => kind_status(source.kind()),
        }
    }

    /// The message returned to the client. Storage details are never included.
    fn public_message(&self) -> String {
        match self {
            Self::Query {
                source: QueryError::Storage(_),
                failure,
            } => failure.to_string(),
            other => other.to_string(),
        }
    }
}

fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Submission(SubmissionError::Storage(cause))
            | Self::Query {
                source: QueryError::Storage(cause),
                ..
            } => error!(error = %cause, "storage failure"),
            _ => {}
        }

        (status, Json(Envelope::failure(self.public_message()))).into_response()
    }
}
