use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnswerId, QuestionId, QuestionType, ResponseId, SurveyId, UserId, ValidatedAnswer};

/// A stored response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "response_id")]
    pub id: ResponseId,

    pub survey_id: SurveyId,

    /// `None` for anonymous responses.
    #[serde(rename = "user_id")]
    pub respondent_id: Option<UserId>,

    pub submitted_at: DateTime<Utc>,
}

/// A stored answer. The text is kept verbatim whatever the question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer_id")]
    pub id: AnswerId,

    pub response_id: ResponseId,
    pub question_id: QuestionId,
    pub answer_text: String,
}

/// A response together with all of its answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseWithAnswers {
    #[serde(flatten)]
    pub record: ResponseRecord,

    pub answers: Vec<Answer>,
}

/// An answer enriched with the question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedAnswer {
    #[serde(flatten)]
    pub answer: Answer,

    pub question_text: String,
    pub question_type: QuestionType,
}

/// A response with survey title and question details, answers in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedResponse {
    #[serde(flatten)]
    pub record: ResponseRecord,

    pub survey_title: String,
    pub answers: Vec<DetailedAnswer>,
}

/// Aggregate counts over a survey's responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub total_responses: u64,

    /// Distinct authenticated respondents; anonymous responses are not counted.
    pub unique_respondents: u64,

    pub anonymous_responses: u64,
}

/// A validated submission handed to the store for atomic insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub survey_id: SurveyId,
    pub respondent_id: Option<UserId>,
    pub answers: Vec<ValidatedAnswer>,
}

/// Pagination for response listings.
///
/// `offset` only takes effect when `limit` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    /// No pagination.
    pub fn all() -> Self {
        Self::default()
    }

    /// Take at most `limit` items.
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    /// Skip `offset` items first. Ignored without a limit.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Apply the page to an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        match self.limit {
            None => items,
            Some(limit) => items
                .into_iter()
                .skip(self.offset.unwrap_or(0) as usize)
                .take(limit as usize)
                .collect(),
        }
    }
}
