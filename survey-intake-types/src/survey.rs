use serde::{Deserialize, Serialize};

use crate::{SurveyId, UserId};

/// A survey as seen by the response pipeline.
///
/// Only the fields needed to decide whether a response may be submitted
/// (and who may read it back) are carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// The survey's identifier.
    #[serde(rename = "survey_id")]
    pub id: SurveyId,

    /// The user who created the survey.
    #[serde(rename = "user_id")]
    pub owner_id: UserId,

    /// Title shown to respondents.
    pub title: String,

    /// Optional longer description.
    pub description: Option<String>,

    /// Responses are only accepted while this is set.
    pub is_active: bool,
}

impl Survey {
    /// Create a new, active survey.
    pub fn new(id: SurveyId, owner_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            title: title.into(),
            description: None,
            is_active: true,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the survey as closed for responses.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check whether the given user created this survey.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Check whether new responses may be submitted.
    pub fn accepts_responses(&self) -> bool {
        self.is_active
    }
}
