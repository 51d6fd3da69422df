use serde::Serialize;
use survey_intake_types::{
    AnswerSet, NewResponse, ResponseWithAnswers, StoreError, SubmissionError, SurveyId,
    SurveyStore, UserId,
};
use tracing::{debug, error, info, instrument};

use crate::validate_answers;

/// Confirmation message returned with every successful submission.
pub const SUBMITTED_MESSAGE: &str = "Response submitted successfully";

/// Where a submission is in the pipeline. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    ReceivedRequest,
    SurveyChecked,
    Validated,
    Persisted,
    Rejected,
}

/// A request to record one respondent's answers to one survey.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub survey_id: SurveyId,

    /// `None` for anonymous submissions.
    pub respondent_id: Option<UserId>,

    pub answers: AnswerSet,
}

impl SubmissionRequest {
    /// Create an anonymous submission.
    pub fn new(survey_id: SurveyId, answers: impl Into<AnswerSet>) -> Self {
        Self {
            survey_id,
            respondent_id: None,
            answers: answers.into(),
        }
    }

    /// Attribute the submission to an authenticated respondent.
    pub fn by(mut self, respondent_id: UserId) -> Self {
        self.respondent_id = Some(respondent_id);
        self
    }
}

/// A persisted response and its confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedResponse {
    pub response: ResponseWithAnswers,
    pub message: &'static str,
}

/// Validate and persist a survey response.
///
/// Gates run in a fixed order and the first failure ends the submission:
/// survey exists, survey is active, a known respondent has not responded yet,
/// answers are a well-formed list, every answer validates, the store commits.
/// Nothing is written unless every gate passes.
///
/// The "already responded" pre-check can race with a concurrent submission by
/// the same respondent; the store's uniqueness constraint catches that case
/// and it is reported the same way.
#[instrument(
    skip_all,
    fields(survey_id = %request.survey_id, respondent_id = ?request.respondent_id)
)]
pub async fn submit_response<S>(
    store: &S,
    request: SubmissionRequest,
) -> Result<SubmittedResponse, SubmissionError>
where
    S: SurveyStore + ?Sized,
{
    debug!(stage = ?SubmissionStage::ReceivedRequest, "submission received");

    let result = run_gates(store, request).await;
    match &result {
        Ok(submitted) => {
            info!(
                response_id = %submitted.response.record.id,
                answers = submitted.response.answers.len(),
                "response submitted"
            );
        }
        Err(SubmissionError::Storage(cause)) => {
            error!(stage = ?SubmissionStage::Rejected, error = %cause, "failed to persist response");
        }
        Err(err) => {
            info!(stage = ?SubmissionStage::Rejected, kind = ?err.kind(), reason = %err, "submission rejected");
        }
    }
    result
}

async fn run_gates<S>(
    store: &S,
    request: SubmissionRequest,
) -> Result<SubmittedResponse, SubmissionError>
where
    S: SurveyStore + ?Sized,
{
    let SubmissionRequest {
        survey_id,
        respondent_id,
        answers,
    } = request;

    let survey = store
        .find_survey(survey_id)
        .await?
        .ok_or(SubmissionError::SurveyNotFound(survey_id))?;

    if !survey.accepts_responses() {
        return Err(SubmissionError::SurveyInactive(survey_id));
    }

    if let Some(respondent_id) = respondent_id
        && store.has_responded(survey_id, respondent_id).await?
    {
        return Err(SubmissionError::AlreadyResponded {
            survey_id,
            respondent_id,
        });
    }
    debug!(stage = ?SubmissionStage::SurveyChecked, "survey accepts this submission");

    let proposed = answers.into_entries()?;
    let questions = store.questions_for_survey(survey_id).await?;
    let validated = validate_answers(&questions, &proposed)?;
    debug!(
        stage = ?SubmissionStage::Validated,
        answers = validated.len(),
        "answers validated"
    );

    let response = store
        .insert_response(NewResponse {
            survey_id,
            respondent_id,
            answers: validated,
        })
        .await
        .map_err(|err| match (err, respondent_id) {
            (StoreError::Conflict(_), Some(respondent_id)) => SubmissionError::AlreadyResponded {
                survey_id,
                respondent_id,
            },
            (err, _) => SubmissionError::Storage(err),
        })?;
    debug!(stage = ?SubmissionStage::Persisted, "response committed");

    Ok(SubmittedResponse {
        response,
        message: SUBMITTED_MESSAGE,
    })
}
