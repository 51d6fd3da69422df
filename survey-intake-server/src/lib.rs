//! HTTP API for survey responses.
//!
//! | method | path                                  | who                    |
//! |--------|---------------------------------------|------------------------|
//! | POST   | `/api/surveys/:survey_id/responses`   | anyone                 |
//! | GET    | `/api/surveys/:survey_id/responses`   | survey owner           |
//! | GET    | `/api/responses/my`                   | authenticated users    |
//! | GET    | `/api/responses/:response_id`         | owner or respondent    |
//! | DELETE | `/api/responses/:response_id`         | survey owner           |
//! | GET    | `/healthz`                            | anyone                 |
//!
//! Every reply is a JSON envelope `{ success, message?, data?, count?, stats? }`.
//! The caller is identified by the `x-user-id` header, see [`identity`].
//!
//! The router is built over any [`SurveyStore`]; the binary uses PostgreSQL,
//! the tests use [`survey_intake::MemoryStore`].

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::get,
};
use survey_intake::SurveyStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use identity::{USER_ID_HEADER, Viewer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route(
            "/api/surveys/:survey_id/responses",
            get(routes::list).post(routes::submit),
        )
        .route("/api/responses/my", get(routes::mine))
        .route(
            "/api/responses/:response_id",
            get(routes::detail).delete(routes::remove),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
