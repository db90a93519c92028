use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use aieditor_core::analysis::AnalysisSettings;
use axum::http::HeaderValue;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The variable is set but does not parse as the expected type.
    #[error("{name} must be a valid {expected} (got {value:?})")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    /// The variable parsed but is outside its allowed range.
    #[error("{name}: {message}")]
    OutOfRange { name: &'static str, message: String },
}

/// Connection settings for the language-model server.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the llama.cpp-compatible server.
    pub server_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// How long to wait for the model to load before marking it failed.
    /// `0` waits forever.
    pub load_timeout_secs: u64,
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        (self.load_timeout_secs > 0).then(|| Duration::from_secs(self.load_timeout_secs))
    }
}

/// Token-bucket parameters applied per client.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Sustained requests per minute.
    pub per_minute: NonZeroU32,
    /// Bucket size (requests allowed back to back).
    pub burst: NonZeroU32,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to the desktop editor
/// on the same machine.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to stop after the server does.
    pub shutdown_timeout_secs: u64,
    /// SQLite database URL.
    pub database_url: String,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub analysis: AnalysisSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                     |
    /// |----------------------------|-----------------------------|
    /// | `HOST`                     | `127.0.0.1`                 |
    /// | `PORT`                     | `3000`                      |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`     |
    /// | `REQUEST_TIMEOUT_SECS`     | `300`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                        |
    /// | `DATABASE_URL`             | `sqlite://aieditor.sqlite3` |
    /// | `LLAMA_SERVER_URL`         | `http://127.0.0.1:9070`     |
    /// | `LLM_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `LLM_LOAD_TIMEOUT_SECS`    | `600` (`0` = forever)       |
    /// | `RATE_LIMIT_PER_MINUTE`    | `60`                        |
    /// | `RATE_LIMIT_BURST`         | `10`                        |
    /// | `SIMILAR_SCENES_LIMIT`     | `5`                         |
    /// | `SIMILARITY_THRESHOLD`     | `0.5`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let host = vars.string("HOST", "127.0.0.1");
        let port: u16 = vars.parse("PORT", "3000", "u16")?;

        let cors_origins: Vec<String> = vars
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins.iter().find(|o| HeaderValue::from_str(o).is_err()) {
            return Err(ConfigError::Invalid {
                name: "CORS_ORIGINS",
                expected: "origin",
                value: bad.clone(),
            });
        }

        let request_timeout_secs = vars.parse("REQUEST_TIMEOUT_SECS", "300", "u64")?;
        let shutdown_timeout_secs = vars.parse("SHUTDOWN_TIMEOUT_SECS", "30", "u64")?;
        let database_url = vars.string("DATABASE_URL", "sqlite://aieditor.sqlite3");

        let llm = LlmConfig {
            server_url: vars.string("LLAMA_SERVER_URL", "http://127.0.0.1:9070"),
            request_timeout_secs: vars.parse("LLM_REQUEST_TIMEOUT_SECS", "30", "u64")?,
            load_timeout_secs: vars.parse("LLM_LOAD_TIMEOUT_SECS", "600", "u64")?,
        };

        let rate_limit = RateLimitConfig {
            per_minute: vars.parse("RATE_LIMIT_PER_MINUTE", "60", "positive integer")?,
            burst: vars.parse("RATE_LIMIT_BURST", "10", "positive integer")?,
        };

        let analysis = AnalysisSettings {
            similarity_threshold: vars.parse("SIMILARITY_THRESHOLD", "0.5", "number")?,
            similar_limit: vars.parse("SIMILAR_SCENES_LIMIT", "5", "positive integer")?,
        };
        analysis
            .validate()
            .map_err(|e| ConfigError::OutOfRange {
                name: "SIMILARITY_THRESHOLD/SIMILAR_SCENES_LIMIT",
                message: e.to_string(),
            })?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            llm,
            rate_limit,
            analysis,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str, default: &str) -> String {
        (self.0)(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(
        &self,
        name: &'static str,
        default: &str,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        let value = self.string(name, default);
        value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        })
    }
}
