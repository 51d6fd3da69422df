//! In-memory store for exercising the pipeline without a database.
//!
//! `MemoryStore` holds surveys, questions, responses and answers behind a
//! single lock. Writes build every row first and publish them in one step, so
//! a failed insert leaves nothing behind, the same guarantee a database
//! transaction gives.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_intake::{MemoryStore, Question, QuestionId, QuestionKind, Survey, SurveyId, UserId};
//!
//! let store = MemoryStore::new()
//!     .with_survey(Survey::new(SurveyId::new(1), UserId::new(7), "Lunch"))
//!     .with_question(
//!         Question::new(QuestionId::new(1), SurveyId::new(1), "Any complaints?", QuestionKind::Text),
//!     );
//! ```

use std::collections::{BTreeMap, HashSet};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use survey_intake_types::{
    Answer, AnswerId, DetailedAnswer, DetailedResponse, NewResponse, Page, Question,
    ResponseId, ResponseRecord, ResponseStats, ResponseStore, ResponseWithAnswers, StoreError,
    Survey, SurveyCatalog, SurveyId, UserId,
};
use tracing::debug;

/// A store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    surveys: BTreeMap<SurveyId, Survey>,
    questions: Vec<Question>,
    responses: BTreeMap<ResponseId, ResponseRecord>,
    answers: Vec<Answer>,
    last_response_id: i64,
    last_answer_id: i64,

    /// Fail the next insert after it has staged its rows.
    fail_next_write: bool,

    /// `has_responded` always answers `false`.
    stale_reads: bool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a survey.
    pub fn with_survey(self, survey: Survey) -> Self {
        self.add_survey(survey);
        self
    }

    /// Add a question. Its survey should already be present.
    pub fn with_question(self, question: Question) -> Self {
        self.add_question(question);
        self
    }

    /// Add or replace a survey.
    pub fn add_survey(&self, survey: Survey) {
        self.inner.lock().surveys.insert(survey.id, survey);
    }

    /// Add or replace a question.
    pub fn add_question(&self, question: Question) {
        let mut inner = self.inner.lock();
        inner.questions.retain(|q| q.id() != question.id());
        inner.questions.push(question);
    }

    /// Make the next `insert_response` fail with a backend error.
    pub fn fail_next_write(&self) {
        self.inner.lock().fail_next_write = true;
    }

    /// Make `has_responded` miss existing responses, as a pre-check racing
    /// with a concurrent submission would.
    pub fn set_stale_reads(&self, stale: bool) {
        self.inner.lock().stale_reads = stale;
    }

    /// Number of stored responses, across all surveys.
    pub fn response_count(&self) -> usize {
        self.inner.lock().responses.len()
    }

    /// Number of stored answers, across all responses.
    pub fn answer_count(&self) -> usize {
        self.inner.lock().answers.len()
    }
}

impl Inner {
    fn answers_of(&self, response_id: ResponseId) -> Vec<Answer> {
        self.answers
            .iter()
            .filter(|a| a.response_id == response_id)
            .cloned()
            .collect()
    }

    /// Responses matching `filter`, newest first.
    fn newest_first(&self, filter: impl Fn(&ResponseRecord) -> bool) -> Vec<ResponseRecord> {
        let mut records: Vec<ResponseRecord> =
            self.responses.values().filter(|r| filter(r)).cloned().collect();
        records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }
}

#[async_trait]
impl SurveyCatalog for MemoryStore {
    async fn find_survey(&self, survey_id: SurveyId) -> Result<Option<Survey>, StoreError> {
        Ok(self.inner.lock().surveys.get(&survey_id).cloned())
    }

    async fn questions_for_survey(&self, survey_id: SurveyId) -> Result<Vec<Question>, StoreError> {
        let inner = self.inner.lock();
        let mut questions: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| q.survey_id() == survey_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.position(), q.id()));
        Ok(questions)
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn has_responded(
        &self,
        survey_id: SurveyId,
        respondent_id: UserId,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock();
        if inner.stale_reads {
            return Ok(false);
        }
        Ok(inner
            .responses
            .values()
            .any(|r| r.survey_id == survey_id && r.respondent_id == Some(respondent_id)))
    }

    async fn insert_response(
        &self,
        response: NewResponse,
    ) -> Result<ResponseWithAnswers, StoreError> {
        let mut inner = self.inner.lock();
        let NewResponse {
            survey_id,
            respondent_id,
            answers,
        } = response;

        if !inner.surveys.contains_key(&survey_id) {
            return Err(StoreError::backend(anyhow!(
                "survey {survey_id} does not exist"
            )));
        }

        if let Some(respondent_id) = respondent_id
            && inner
                .responses
                .values()
                .any(|r| r.survey_id == survey_id && r.respondent_id == Some(respondent_id))
        {
            return Err(StoreError::Conflict(format!(
                "respondent {respondent_id} already answered survey {survey_id}"
            )));
        }

        let survey_questions: HashSet<_> = inner
            .questions
            .iter()
            .filter(|q| q.survey_id() == survey_id)
            .map(Question::id)
            .collect();

        // stage every row before touching shared state
        let response_id = ResponseId::new(inner.last_response_id + 1);
        let record = ResponseRecord {
            id: response_id,
            survey_id,
            respondent_id,
            submitted_at: Utc::now(),
        };
        let mut staged = Vec::with_capacity(answers.len());
        for (offset, answer) in answers.into_iter().enumerate() {
            if !survey_questions.contains(&answer.question_id) {
                return Err(StoreError::backend(anyhow!(
                    "question {} is not part of survey {survey_id}",
                    answer.question_id
                )));
            }
            staged.push(Answer {
                id: AnswerId::new(inner.last_answer_id + 1 + offset as i64),
                response_id,
                question_id: answer.question_id,
                answer_text: answer.answer_text,
            });
        }

        if std::mem::take(&mut inner.fail_next_write) {
            return Err(StoreError::backend(anyhow!("simulated write failure")));
        }

        // publish
        inner.last_response_id = response_id.get();
        inner.last_answer_id += staged.len() as i64;
        inner.responses.insert(response_id, record.clone());
        inner.answers.extend(staged.iter().cloned());
        debug!(%response_id, answers = staged.len(), "stored response in memory");

        Ok(ResponseWithAnswers {
            record,
            answers: staged,
        })
    }

    async fn find_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<ResponseRecord>, StoreError> {
        Ok(self.inner.lock().responses.get(&response_id).cloned())
    }

    async fn find_detailed_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<DetailedResponse>, StoreError> {
        let inner = self.inner.lock();
        let Some(record) = inner.responses.get(&response_id).cloned() else {
            return Ok(None);
        };
        let Some(survey) = inner.surveys.get(&record.survey_id) else {
            return Ok(None);
        };

        let mut answers: Vec<(i32, DetailedAnswer)> = inner
            .answers_of(response_id)
            .into_iter()
            .filter_map(|answer| {
                let question = inner.questions.iter().find(|q| q.id() == answer.question_id)?;
                Some((
                    question.position(),
                    DetailedAnswer {
                        answer,
                        question_text: question.text().to_string(),
                        question_type: question.kind().question_type(),
                    },
                ))
            })
            .collect();
        answers.sort_by_key(|(position, _)| *position);

        Ok(Some(DetailedResponse {
            record,
            survey_title: survey.title.clone(),
            answers: answers.into_iter().map(|(_, answer)| answer).collect(),
        }))
    }

    async fn responses_for_survey(
        &self,
        survey_id: SurveyId,
        page: Page,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(page.slice(inner.newest_first(|r| r.survey_id == survey_id)))
    }

    async fn responses_for_survey_with_answers(
        &self,
        survey_id: SurveyId,
    ) -> Result<Vec<ResponseWithAnswers>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .newest_first(|r| r.survey_id == survey_id)
            .into_iter()
            .map(|record| ResponseWithAnswers {
                answers: inner.answers_of(record.id),
                record,
            })
            .collect())
    }

    async fn responses_by_respondent(
        &self,
        respondent_id: UserId,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.newest_first(|r| r.respondent_id == Some(respondent_id)))
    }

    async fn delete_response(&self, response_id: ResponseId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        if inner.responses.remove(&response_id).is_none() {
            return Ok(false);
        }
        inner.answers.retain(|a| a.response_id != response_id);
        Ok(true)
    }

    async fn survey_stats(&self, survey_id: SurveyId) -> Result<ResponseStats, StoreError> {
        let inner = self.inner.lock();
        let mut stats = ResponseStats::default();
        let mut respondents = HashSet::new();
        for record in inner.responses.values().filter(|r| r.survey_id == survey_id) {
            stats.total_responses += 1;
            match record.respondent_id {
                Some(user) => {
                    respondents.insert(user);
                }
                None => stats.anonymous_responses += 1,
            }
        }
        stats.unique_respondents = respondents.len() as u64;
        Ok(stats)
    }
}
