//! PostgreSQL store for survey-intake.
//!
//! [`PgStore`] implements both halves of the store seam on a
//! `deadpool-postgres` pool. Each response is written in a single transaction;
//! a second response by the same respondent trips a unique index and comes
//! back as [`StoreError::Conflict`](survey_intake_types::StoreError::Conflict).
//!
//! # Example
//!
//! ```ignore
//! use survey_intake_postgres::{PgConfig, PgStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = PgStore::connect(&PgConfig::from_env()?).await?;
//!     store.migrate().await?;
//!     // hand `store` to `survey_intake::submit_response`
//!     store.close();
//!     Ok(())
//! }
//! ```

mod config;
mod store;

pub use config::{
    ConfigError, DEFAULT_DB_NAME, DEFAULT_HOST, DEFAULT_POOL_SIZE, DEFAULT_PORT, DEFAULT_USER,
    PgConfig,
};
pub use store::{PgStore, SCHEMA};
