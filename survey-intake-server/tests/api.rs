//! Drives the router end to end against an in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use survey_intake::{
    ChoiceOptions, MemoryStore, Question, QuestionId, QuestionKind, Survey, SurveyId, UserId,
};
use survey_intake_server::{AppState, USER_ID_HEADER, router};
use tower::ServiceExt;

const OWNER: i64 = 100;

fn store() -> Arc<MemoryStore> {
    let survey = SurveyId::new(1);
    Arc::new(
        MemoryStore::new()
            .with_survey(Survey::new(survey, UserId::new(OWNER), "Office move"))
            .with_survey(Survey::new(SurveyId::new(2), UserId::new(OWNER), "Old poll").inactive())
            .with_question(
                Question::new(
                    QuestionId::new(1),
                    survey,
                    "Preferred floor",
                    QuestionKind::SingleChoice(ChoiceOptions::new(["3", "4"]).unwrap()),
                )
                .required(true)
                .at_position(1),
            )
            .with_question(
                Question::new(QuestionId::new(2), survey, "Rate the plan", QuestionKind::Rating)
                    .at_position(2),
            ),
    )
}

fn app(store: Arc<MemoryStore>) -> Router {
    router(AppState::new(store))
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(USER_ID_HEADER, user);
    }
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn answers() -> Value {
    json!({
        "answers": [
            {"question_id": 1, "answer_text": "4"},
            {"question_id": 2, "answer_text": 8}
        ]
    })
}

#[tokio::test]
async fn submit_returns_created() {
    let store = store();
    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/surveys/1/responses",
        Some("7"),
        Some(answers()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Response submitted successfully");
    assert_eq!(body["data"]["survey_id"], 1);
    assert_eq!(body["data"]["user_id"], 7);
    assert_eq!(body["data"]["answers"][1]["answer_text"], "8");
    assert_eq!(store.answer_count(), 2);
}

#[tokio::test]
async fn anonymous_submission_has_no_user() {
    let (status, body) = send(
        app(store()),
        Method::POST,
        "/api/surveys/1/responses",
        None,
        Some(answers()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user_id"], Value::Null);
}

#[tokio::test]
async fn submission_failures_map_to_statuses() {
    let store = store();
    let cases = [
        ("/api/surveys/9/responses", Some(answers()), StatusCode::NOT_FOUND, "Survey not found"),
        (
            "/api/surveys/2/responses",
            Some(answers()),
            StatusCode::FORBIDDEN,
            "This survey is not currently accepting responses",
        ),
        ("/api/surveys/abc/responses", Some(answers()), StatusCode::BAD_REQUEST, "Invalid survey ID"),
        ("/api/surveys/1/responses", None, StatusCode::BAD_REQUEST, "Answers array is required"),
        (
            "/api/surveys/1/responses",
            Some(json!({"answers": {"question_id": 1}})),
            StatusCode::BAD_REQUEST,
            "Answers must be an array",
        ),
        (
            "/api/surveys/1/responses",
            Some(json!({"answers": [{"question_id": 1, "answer_text": "5"}]})),
            StatusCode::BAD_REQUEST,
            "Invalid option for question \"Preferred floor\"",
        ),
    ];

    for (uri, body, status, message) in cases {
        let (got, body) = send(app(store.clone()), Method::POST, uri, None, body).await;
        assert_eq!(got, status, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message);
    }
    assert_eq!(store.response_count(), 0);
}

#[tokio::test]
async fn duplicate_submission_is_a_conflict() {
    let store = store();
    let submit = || {
        send(
            app(store.clone()),
            Method::POST,
            "/api/surveys/1/responses",
            Some("7"),
            Some(answers()),
        )
    };

    assert_eq!(submit().await.0, StatusCode::CREATED);
    let (status, body) = submit().await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "You have already submitted a response to this survey"
    );
}

#[tokio::test]
async fn storage_failure_is_generic() {
    let store = store();
    store.fail_next_write();

    let (status, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/surveys/1/responses",
        None,
        Some(answers()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to submit response");
    assert_eq!(store.response_count(), 0);
}

#[tokio::test]
async fn malformed_identity_is_rejected() {
    let (status, body) = send(
        app(store()),
        Method::POST,
        "/api/surveys/1/responses",
        Some("bob"),
        Some(answers()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user ID");
}

#[tokio::test]
async fn owner_lists_with_stats() {
    let store = store();
    for user in ["7", "8"] {
        send(
            app(store.clone()),
            Method::POST,
            "/api/surveys/1/responses",
            Some(user),
            Some(answers()),
        )
        .await;
    }

    let (status, body) = send(
        app(store.clone()),
        Method::GET,
        "/api/surveys/1/responses?limit=1",
        Some("100"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["stats"]["totalResponses"], 2);
    assert_eq!(body["stats"]["uniqueRespondents"], 2);
    assert!(body["data"][0].get("answers").is_none());

    let (_, body) = send(
        app(store.clone()),
        Method::GET,
        "/api/surveys/1/responses?includeAnswers=true",
        Some("100"),
        None,
    )
    .await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["answers"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        app(store.clone()),
        Method::GET,
        "/api/surveys/1/responses",
        Some("7"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(app(store), Method::GET, "/api/surveys/1/responses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn respondent_reads_and_owner_deletes() {
    let store = store();
    let (_, body) = send(
        app(store.clone()),
        Method::POST,
        "/api/surveys/1/responses",
        Some("7"),
        Some(answers()),
    )
    .await;
    let id = body["data"]["response_id"].as_i64().unwrap();
    let uri = format!("/api/responses/{id}");

    let (status, body) = send(app(store.clone()), Method::GET, &uri, Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["survey_title"], "Office move");
    assert_eq!(body["data"]["answers"][0]["question_type"], "single_choice");

    let (status, body) = send(app(store.clone()), Method::GET, "/api/responses/my", Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = send(app(store.clone()), Method::DELETE, &uri, Some("7"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(app(store.clone()), Method::DELETE, &uri, Some("100"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Response deleted successfully");
    assert_eq!(store.answer_count(), 0);

    let (status, body) = send(app(store.clone()), Method::GET, &uri, Some("100"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Response not found");

    let (status, _) = send(app(store), Method::GET, "/api/responses/xyz", Some("100"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_check() {
    let (status, body) = send(app(store()), Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
