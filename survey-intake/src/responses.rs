//! Reading back and deleting stored responses.
//!
//! These are for survey owners (and, for a single response, its respondent).
//! Authentication happens upstream; every function takes the already
//! authenticated viewer.

use serde::Serialize;
use survey_intake_types::{
    DetailedResponse, Page, QueryError, ResponseId, ResponseRecord, ResponseStats,
    ResponseWithAnswers, Survey, SurveyCatalog, SurveyId, SurveyStore, UserId,
};
use tracing::{info, instrument};

/// How to list a survey's responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Paginate plain listings. Ignored when `include_answers` is set.
    pub page: Page,

    /// Return every response with its answers.
    pub include_answers: bool,
}

/// A survey's responses, with or without answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SurveyResponses {
    Records(Vec<ResponseRecord>),
    WithAnswers(Vec<ResponseWithAnswers>),
}

impl SurveyResponses {
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::WithAnswers(responses) => responses.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of listing a survey's responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyResponseListing {
    pub responses: SurveyResponses,
    pub stats: ResponseStats,
}

/// List the responses to a survey. Only the survey owner may do this.
#[instrument(skip(store))]
pub async fn list_survey_responses<S>(
    store: &S,
    survey_id: SurveyId,
    viewer: UserId,
    options: ListOptions,
) -> Result<SurveyResponseListing, QueryError>
where
    S: SurveyStore + ?Sized,
{
    ensure_owner(store, survey_id, viewer, "view responses for this survey").await?;

    let responses = if options.include_answers {
        SurveyResponses::WithAnswers(store.responses_for_survey_with_answers(survey_id).await?)
    } else {
        SurveyResponses::Records(store.responses_for_survey(survey_id, options.page).await?)
    };
    let stats = store.survey_stats(survey_id).await?;

    Ok(SurveyResponseListing { responses, stats })
}

/// Get one response in detail. Allowed for the survey owner and the respondent.
#[instrument(skip(store))]
pub async fn get_response<S>(
    store: &S,
    response_id: ResponseId,
    viewer: UserId,
) -> Result<DetailedResponse, QueryError>
where
    S: SurveyStore + ?Sized,
{
    let response = store
        .find_detailed_response(response_id)
        .await?
        .ok_or(QueryError::ResponseNotFound(response_id))?;

    if response.record.respondent_id != Some(viewer) {
        ensure_owner(store, response.record.survey_id, viewer, "view this response").await?;
    }

    Ok(response)
}

/// The viewer's own responses, newest first.
pub async fn my_responses<S>(store: &S, viewer: UserId) -> Result<Vec<ResponseRecord>, QueryError>
where
    S: SurveyStore + ?Sized,
{
    Ok(store.responses_by_respondent(viewer).await?)
}

/// Delete a response and its answers. Only the survey owner may do this.
#[instrument(skip(store))]
pub async fn delete_response<S>(
    store: &S,
    response_id: ResponseId,
    viewer: UserId,
) -> Result<(), QueryError>
where
    S: SurveyStore + ?Sized,
{
    let record = store
        .find_response(response_id)
        .await?
        .ok_or(QueryError::ResponseNotFound(response_id))?;

    ensure_owner(store, record.survey_id, viewer, "delete this response").await?;

    // someone else may have deleted it in the meantime
    if !store.delete_response(response_id).await? {
        return Err(QueryError::ResponseNotFound(response_id));
    }

    info!(%response_id, survey_id = %record.survey_id, "response deleted");
    Ok(())
}

async fn ensure_owner<S>(
    store: &S,
    survey_id: SurveyId,
    viewer: UserId,
    action: &'static str,
) -> Result<Survey, QueryError>
where
    S: SurveyCatalog + ?Sized,
{
    match store.find_survey(survey_id).await? {
        Some(survey) if survey.is_owned_by(viewer) => Ok(survey),
        _ => Err(QueryError::Forbidden { action }),
    }
}
