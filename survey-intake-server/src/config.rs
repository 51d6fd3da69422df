use std::net::SocketAddr;

use survey_intake_postgres::{ConfigError, PgConfig};
use tracing::info;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database: PgConfig,
}

impl ServerConfig {
    /// Read settings from the environment. Call after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = match lookup("SURVEY_INTAKE_BIND") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "SURVEY_INTAKE_BIND",
                expected: "a socket address such as 127.0.0.1:8080",
                value,
            })?,
            None => {
                info!(default = DEFAULT_BIND, "SURVEY_INTAKE_BIND not set, using default");
                default_bind()
            }
        };

        Ok(Self {
            bind,
            database: PgConfig::from_lookup(lookup)?,
        })
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
