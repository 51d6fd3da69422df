use async_trait::async_trait;

use crate::{
    DetailedResponse, NewResponse, Page, Question, ResponseId, ResponseRecord, ResponseStats,
    ResponseWithAnswers, StoreError, Survey, SurveyId, UserId,
};

/// Read access to surveys and their questions.
///
/// Surveys and questions are authored elsewhere; the response pipeline only
/// ever reads them.
#[async_trait]
pub trait SurveyCatalog: Send + Sync {
    /// Look up a survey, `None` if it does not exist.
    async fn find_survey(&self, survey_id: SurveyId) -> Result<Option<Survey>, StoreError>;

    /// All questions of a survey, ordered by position.
    async fn questions_for_survey(&self, survey_id: SurveyId) -> Result<Vec<Question>, StoreError>;
}

/// Storage for responses and their answers.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Check whether the respondent already has a response for the survey.
    async fn has_responded(
        &self,
        survey_id: SurveyId,
        respondent_id: UserId,
    ) -> Result<bool, StoreError>;

    /// Insert one response and all of its answers atomically.
    ///
    /// Either every row becomes visible or none does. A second response by
    /// the same known respondent for the same survey must fail with
    /// `StoreError::Conflict`.
    async fn insert_response(
        &self,
        response: NewResponse,
    ) -> Result<ResponseWithAnswers, StoreError>;

    async fn find_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<ResponseRecord>, StoreError>;

    /// A response with survey title and question details.
    async fn find_detailed_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<DetailedResponse>, StoreError>;

    /// Responses of a survey, newest first.
    async fn responses_for_survey(
        &self,
        survey_id: SurveyId,
        page: Page,
    ) -> Result<Vec<ResponseRecord>, StoreError>;

    /// Every response of a survey with its answers, newest first.
    async fn responses_for_survey_with_answers(
        &self,
        survey_id: SurveyId,
    ) -> Result<Vec<ResponseWithAnswers>, StoreError>;

    /// Responses submitted by a user, newest first.
    async fn responses_by_respondent(
        &self,
        respondent_id: UserId,
    ) -> Result<Vec<ResponseRecord>, StoreError>;

    /// Delete a response and its answers. Returns `false` if it did not exist.
    async fn delete_response(&self, response_id: ResponseId) -> Result<bool, StoreError>;

    async fn survey_stats(&self, survey_id: SurveyId) -> Result<ResponseStats, StoreError>;
}

/// A backend that provides both halves of the store seam.
pub trait SurveyStore: SurveyCatalog + ResponseStore {}

impl<T> SurveyStore for T where T: SurveyCatalog + ResponseStore + ?Sized {}
