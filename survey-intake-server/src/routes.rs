use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use survey_intake::{
    AnswerSet, ListOptions, Page, ResponseId, ResponseStats, SubmissionRequest, SurveyId,
    delete_response, get_response, list_survey_responses, my_responses, submit_response,
};

use crate::{ApiError, AppState, Viewer};

pub const DELETED_MESSAGE: &str = "Response deleted successfully";

/// The JSON body of every reply.
#[derive(Debug, Serialize)]
pub struct Envelope<T = ()> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ResponseStats>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
            stats: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn stats(mut self, stats: ResponseStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

impl Envelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            count: None,
            stats: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            ..Self::failure(message)
        }
    }
}

/// Query string of the listing route. Values are validated by hand so that
/// bad input gets the usual error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
    offset: Option<String>,

    #[serde(rename = "includeAnswers", alias = "include_answers")]
    include_answers: Option<String>,
}

impl ListParams {
    fn into_options(self) -> Result<ListOptions, ApiError> {
        let number = |value: Option<String>| {
            value
                .map(|value| value.trim().parse::<u32>().map_err(|_| ApiError::InvalidPage))
                .transpose()
        };

        Ok(ListOptions {
            page: Page {
                limit: number(self.limit)?,
                offset: number(self.offset)?,
            },
            include_answers: self.include_answers.as_deref() == Some("true"),
        })
    }
}

fn survey_id(raw: &str) -> Result<SurveyId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidSurveyId)
}

fn response_id(raw: &str) -> Result<ResponseId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidResponseId)
}

/// Pull the `answers` field out of a request body, if there is one.
///
/// A missing body, an empty body, or a body that is not an object all count
/// as "no answers"; the pipeline reports that after checking the survey.
fn answers_field(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice(body).map_err(|_| ApiError::MalformedBody)? {
        Value::Object(mut fields) => Ok(fields.remove("answers")),
        _ => Ok(None),
    }
}

pub async fn healthz() -> impl IntoResponse {
    Json(Envelope::ok("ok"))
}

/// `POST /api/surveys/:survey_id/responses`
pub async fn submit(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let survey_id = survey_id(&raw_id)?;
    let answers = AnswerSet::from_json(answers_field(&body)?);

    let mut request = SubmissionRequest::new(survey_id, answers);
    if let Viewer(Some(respondent)) = viewer {
        request = request.by(respondent);
    }

    let submitted = submit_response(state.store.as_ref(), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(submitted.response).message(submitted.message)),
    ))
}

/// `GET /api/surveys/:survey_id/responses`
pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_id = survey_id(&raw_id)?;
    let viewer = viewer.require()?;
    let options = params.into_options()?;

    let listing = list_survey_responses(state.store.as_ref(), survey_id, viewer, options)
        .await
        .map_err(ApiError::query("Failed to fetch responses"))?;

    let count = listing.responses.len();
    Ok(Json(
        Envelope::data(listing.responses)
            .count(count)
            .stats(listing.stats),
    ))
}

/// `GET /api/responses/my`
pub async fn mine(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = viewer.require()?;
    let records = my_responses(state.store.as_ref(), viewer)
        .await
        .map_err(ApiError::query("Failed to fetch responses"))?;

    let count = records.len();
    Ok(Json(Envelope::data(records).count(count)))
}

/// `GET /api/responses/:response_id`
pub async fn detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response_id = response_id(&raw_id)?;
    let viewer = viewer.require()?;

    let response = get_response(state.store.as_ref(), response_id, viewer)
        .await
        .map_err(ApiError::query("Failed to fetch response"))?;
    Ok(Json(Envelope::data(response)))
}

/// `DELETE /api/responses/:response_id`
pub async fn remove(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response_id = response_id(&raw_id)?;
    let viewer = viewer.require()?;

    delete_response(state.store.as_ref(), response_id, viewer)
        .await
        .map_err(ApiError::query("Failed to delete response"))?;
    Ok(Json(Envelope::ok(DELETED_MESSAGE)))
}
