use std::env;

use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    server: ServerSettings,
    api: ApiSettings,
    security: SecuritySettings,
    database: DatabaseSettings,
    telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
struct ServerSettings {
    host: String,
    port: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) api_v1_str: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SecuritySettings {
    pub(crate) secret_key: String,
    pub(crate) algorithm: String,
    pub(crate) access_token_expire_minutes: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) database_url: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QUIZDECK_HOST", "0.0.0.0");
        let port = parse("QUIZDECK_PORT", env_or_default("QUIZDECK_PORT", "8000"))?;

        let project_name = env_or_default("PROJECT_NAME", "QuizDeck API");
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = env_optional("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let access_token_expire_minutes = parse(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "90"),
        )?;

        let database_url = env_or_default("DATABASE_URL", "postgresql://localhost:5432/quizdeck");

        let log_level = env_or_default("QUIZDECK_LOG_LEVEL", "info");
        let json = env_optional("QUIZDECK_LOG_JSON")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false);

        Ok(Self {
            server: ServerSettings { host, port },
            api: ApiSettings { project_name, api_v1_str },
            security: SecuritySettings { secret_key, algorithm, access_token_expire_minutes },
            database: DatabaseSettings { database_url },
            telemetry: TelemetrySettings { log_level, json },
        })
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse<T: std::str::FromStr>(field: &'static str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue { field, value })
}
