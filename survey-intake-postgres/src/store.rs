//! `SurveyStore` implementation on a `deadpool-postgres` pool.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Object, Pool, Runtime, Transaction};
use survey_intake_types::{
    Answer, AnswerId, DetailedAnswer, DetailedResponse, NewResponse, Page, Question, QuestionId,
    QuestionKind, QuestionType, ResponseId, ResponseRecord, ResponseStats, ResponseStore,
    ResponseWithAnswers, StoreError, Survey, SurveyCatalog, SurveyId, UserId,
};
use tokio_postgres::{NoTls, Row, error::SqlState};
use tracing::{debug, info, warn};

use crate::PgConfig;

/// The bundled schema, applied by [`PgStore::migrate`].
pub const SCHEMA: &str = include_str!("schema.sql");

/// A PostgreSQL-backed store.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a pool from `config` and check that a connection can be made.
    pub async fn connect(config: &PgConfig) -> Result<Self, StoreError> {
        info!(target = %config.target(), pool_size = config.pool_size, "connecting to database");

        let pool = config
            .to_deadpool()
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(StoreError::backend)?;
        let store = Self::new(pool);
        store.client().await?;

        info!("database connection established");
        Ok(store)
    }

    /// Apply the bundled schema. Existing tables are left alone.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        self.client()
            .await?
            .batch_execute(SCHEMA)
            .await
            .map_err(db_error)?;
        debug!("schema applied");
        Ok(())
    }

    /// The underlying pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Close the pool. Connections in use are dropped once returned.
    pub fn close(&self) {
        self.pool.close();
        info!("database pool closed");
    }

    async fn client(&self) -> Result<Object, StoreError> {
        self.pool.get().await.map_err(StoreError::backend)
    }
}

#[async_trait]
impl SurveyCatalog for PgStore {
    async fn find_survey(&self, survey_id: SurveyId) -> Result<Option<Survey>, StoreError> {
        let row = self
            .client()
            .await?
            .query_opt(
                "SELECT survey_id, user_id, title, description, is_active
                 FROM surveys WHERE survey_id = $1",
                &[&survey_id.get()],
            )
            .await
            .map_err(db_error)?;

        row.as_ref().map(survey_from_row).transpose()
    }

    async fn questions_for_survey(&self, survey_id: SurveyId) -> Result<Vec<Question>, StoreError> {
        let rows = self
            .client()
            .await?
            .query(
                "SELECT question_id, survey_id, question_text, question_type, options,
                        is_required, position
                 FROM questions WHERE survey_id = $1
                 ORDER BY position, question_id",
                &[&survey_id.get()],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(question_from_row).collect()
    }
}

#[async_trait]
impl ResponseStore for PgStore {
    async fn has_responded(
        &self,
        survey_id: SurveyId,
        respondent_id: UserId,
    ) -> Result<bool, StoreError> {
        let row = self
            .client()
            .await?
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM responses WHERE survey_id = $1 AND user_id = $2)",
                &[&survey_id.get(), &respondent_id.get()],
            )
            .await
            .map_err(db_error)?;

        row.try_get(0).map_err(db_error)
    }

    async fn insert_response(
        &self,
        response: NewResponse,
    ) -> Result<ResponseWithAnswers, StoreError> {
        let mut client = self.client().await?;
        let tx = client.transaction().await.map_err(db_error)?;

        match write_response(&tx, &response).await {
            Ok(written) => {
                tx.commit().await.map_err(db_error)?;
                Ok(written)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn find_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<ResponseRecord>, StoreError> {
        let row = self
            .client()
            .await?
            .query_opt(
                "SELECT response_id, survey_id, user_id, submitted_at
                 FROM responses WHERE response_id = $1",
                &[&response_id.get()],
            )
            .await
            .map_err(db_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_detailed_response(
        &self,
        response_id: ResponseId,
    ) -> Result<Option<DetailedResponse>, StoreError> {
        let client = self.client().await?;
        let Some(row) = client
            .query_opt(
                "SELECT r.response_id, r.survey_id, r.user_id, r.submitted_at, s.title
                 FROM responses r JOIN surveys s ON s.survey_id = r.survey_id
                 WHERE r.response_id = $1",
                &[&response_id.get()],
            )
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let record = record_from_row(&row)?;
        let survey_title = row.try_get("title").map_err(db_error)?;

        let answers = client
            .query(
                "SELECT a.answer_id, a.response_id, a.question_id, a.answer_text,
                        q.question_text, q.question_type
                 FROM answers a JOIN questions q ON q.question_id = a.question_id
                 WHERE a.response_id = $1
                 ORDER BY q.position, q.question_id",
                &[&response_id.get()],
            )
            .await
            .map_err(db_error)?
            .iter()
            .map(|row| -> Result<DetailedAnswer, StoreError> {
                let question_type: String = row.try_get("question_type").map_err(db_error)?;
                Ok(DetailedAnswer {
                    answer: answer_from_row(row)?,
                    question_text: row.try_get("question_text").map_err(db_error)?,
                    question_type: question_type
                        .parse::<QuestionType>()
                        .map_err(StoreError::backend)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(DetailedResponse {
            record,
            survey_title,
            answers,
        }))
    }

    async fn responses_for_survey(
        &self,
        survey_id: SurveyId,
        page: Page,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        // LIMIT NULL means no limit; the offset is only honoured with a limit
        let (limit, offset) = match page.limit {
            Some(limit) => (Some(i64::from(limit)), i64::from(page.offset.unwrap_or(0))),
            None => (None, 0),
        };

        let rows = self
            .client()
            .await?
            .query(
                "SELECT response_id, survey_id, user_id, submitted_at
                 FROM responses WHERE survey_id = $1
                 ORDER BY submitted_at DESC, response_id DESC
                 LIMIT $2 OFFSET $3",
                &[&survey_id.get(), &limit, &offset],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn responses_for_survey_with_answers(
        &self,
        survey_id: SurveyId,
    ) -> Result<Vec<ResponseWithAnswers>, StoreError> {
        let client = self.client().await?;
        let records = client
            .query(
                "SELECT response_id, survey_id, user_id, submitted_at
                 FROM responses WHERE survey_id = $1
                 ORDER BY submitted_at DESC, response_id DESC",
                &[&survey_id.get()],
            )
            .await
            .map_err(db_error)?
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let mut answers: HashMap<ResponseId, Vec<Answer>> = HashMap::new();
        for row in client
            .query(
                "SELECT a.answer_id, a.response_id, a.question_id, a.answer_text
                 FROM answers a JOIN responses r ON r.response_id = a.response_id
                 WHERE r.survey_id = $1
                 ORDER BY a.answer_id",
                &[&survey_id.get()],
            )
            .await
            .map_err(db_error)?
        {
            let answer = answer_from_row(&row)?;
            answers.entry(answer.response_id).or_default().push(answer);
        }

        Ok(records
            .into_iter()
            .map(|record| ResponseWithAnswers {
                answers: answers.remove(&record.id).unwrap_or_default(),
                record,
            })
            .collect())
    }

    async fn responses_by_respondent(
        &self,
        respondent_id: UserId,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        let rows = self
            .client()
            .await?
            .query(
                "SELECT response_id, survey_id, user_id, submitted_at
                 FROM responses WHERE user_id = $1
                 ORDER BY submitted_at DESC, response_id DESC",
                &[&respondent_id.get()],
            )
            .await
            .map_err(db_error)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn delete_response(&self, response_id: ResponseId) -> Result<bool, StoreError> {
        let deleted = self
            .client()
            .await?
            .execute(
                "DELETE FROM responses WHERE response_id = $1",
                &[&response_id.get()],
            )
            .await
            .map_err(db_error)?;

        Ok(deleted > 0)
    }

    async fn survey_stats(&self, survey_id: SurveyId) -> Result<ResponseStats, StoreError> {
        let row = self
            .client()
            .await?
            .query_one(
                "SELECT COUNT(*) AS total_responses,
                        COUNT(DISTINCT user_id) AS unique_respondents,
                        COUNT(*) FILTER (WHERE user_id IS NULL) AS anonymous_responses
                 FROM responses WHERE survey_id = $1",
                &[&survey_id.get()],
            )
            .await
            .map_err(db_error)?;

        Ok(ResponseStats {
            total_responses: count(&row, "total_responses")?,
            unique_respondents: count(&row, "unique_respondents")?,
            anonymous_responses: count(&row, "anonymous_responses")?,
        })
    }
}

/// Insert the response row and one row per answer inside `tx`.
///
/// An answer whose question is not part of the survey aborts the write.
async fn write_response(
    tx: &Transaction<'_>,
    response: &NewResponse,
) -> Result<ResponseWithAnswers, StoreError> {
    let survey_id = response.survey_id.get();
    let user_id = response.respondent_id.map(UserId::get);

    let row = tx
        .query_one(
            "INSERT INTO responses (survey_id, user_id) VALUES ($1, $2)
             RETURNING response_id, submitted_at",
            &[&survey_id, &user_id],
        )
        .await
        .map_err(db_error)?;
    let response_id = ResponseId::new(row.try_get("response_id").map_err(db_error)?);
    let submitted_at: DateTime<Utc> = row.try_get("submitted_at").map_err(db_error)?;

    let insert_answer = tx
        .prepare(
            "INSERT INTO answers (response_id, question_id, answer_text)
             SELECT $1, question_id, $3 FROM questions
             WHERE question_id = $2 AND survey_id = $4
             RETURNING answer_id",
        )
        .await
        .map_err(db_error)?;

    let mut answers = Vec::with_capacity(response.answers.len());
    for answer in &response.answers {
        let row = tx
            .query_opt(
                &insert_answer,
                &[
                    &response_id.get(),
                    &answer.question_id.get(),
                    &answer.answer_text,
                    &survey_id,
                ],
            )
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                StoreError::backend(anyhow::anyhow!(
                    "question {} is not part of survey {}",
                    answer.question_id,
                    response.survey_id
                ))
            })?;

        answers.push(Answer {
            id: AnswerId::new(row.try_get("answer_id").map_err(db_error)?),
            response_id,
            question_id: answer.question_id,
            answer_text: answer.answer_text.clone(),
        });
    }

    Ok(ResponseWithAnswers {
        record: ResponseRecord {
            id: response_id,
            survey_id: response.survey_id,
            respondent_id: response.respondent_id,
            submitted_at,
        },
        answers,
    })
}

/// Classify a driver error. Unique violations become `Conflict`.
pub(crate) fn db_error(err: tokio_postgres::Error) -> StoreError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint = err
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or("unique constraint")
            .to_string();
        return StoreError::Conflict(constraint);
    }
    StoreError::backend(err)
}

fn survey_from_row(row: &Row) -> Result<Survey, StoreError> {
    Ok(Survey {
        id: SurveyId::new(row.try_get("survey_id").map_err(db_error)?),
        owner_id: UserId::new(row.try_get("user_id").map_err(db_error)?),
        title: row.try_get("title").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        is_active: row.try_get("is_active").map_err(db_error)?,
    })
}

fn question_from_row(row: &Row) -> Result<Question, StoreError> {
    let question_type: String = row.try_get("question_type").map_err(db_error)?;
    let options: Option<serde_json::Value> = row.try_get("options").map_err(db_error)?;
    let kind = question_kind(&question_type, options)?;

    Ok(Question::new(
        QuestionId::new(row.try_get("question_id").map_err(db_error)?),
        SurveyId::new(row.try_get("survey_id").map_err(db_error)?),
        row.try_get::<_, String>("question_text").map_err(db_error)?,
        kind,
    )
    .required(row.try_get("is_required").map_err(db_error)?)
    .at_position(row.try_get("position").map_err(db_error)?))
}

/// Rebuild a question kind from its `question_type` and JSONB `options` columns.
fn question_kind(
    question_type: &str,
    options: Option<serde_json::Value>,
) -> Result<QuestionKind, StoreError> {
    let question_type: QuestionType = question_type.parse().map_err(StoreError::backend)?;
    let options = match options {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<Vec<String>>(value).map_err(StoreError::backend)?,
        ),
    };
    QuestionKind::from_parts(question_type, options).map_err(StoreError::backend)
}

fn record_from_row(row: &Row) -> Result<ResponseRecord, StoreError> {
    Ok(ResponseRecord {
        id: ResponseId::new(row.try_get("response_id").map_err(db_error)?),
        survey_id: SurveyId::new(row.try_get("survey_id").map_err(db_error)?),
        respondent_id: row
            .try_get::<_, Option<i64>>("user_id")
            .map_err(db_error)?
            .map(UserId::new),
        submitted_at: row.try_get("submitted_at").map_err(db_error)?,
    })
}

fn answer_from_row(row: &Row) -> Result<Answer, StoreError> {
    Ok(Answer {
        id: AnswerId::new(row.try_get("answer_id").map_err(db_error)?),
        response_id: ResponseId::new(row.try_get("response_id").map_err(db_error)?),
        question_id: QuestionId::new(row.try_get("question_id").map_err(db_error)?),
        answer_text: row.try_get("answer_text").map_err(db_error)?,
    })
}

fn count(row: &Row, column: &str) -> Result<u64, StoreError> {
    let value: i64 = row.try_get(column).map_err(db_error)?;
    u64::try_from(value).map_err(StoreError::backend)
}
