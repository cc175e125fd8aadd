//! # configs
//!
//! Runtime settings for the stack-quiz binary.
//!
//! Sources, later ones winning: built-in defaults, an optional
//! `stack-quiz.{toml,json,yaml}` file in the working directory, then
//! `STACK_QUIZ_*` environment variables (a `.env` file is honored through
//! [`load_env_file`]).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use sq_core::settings::ApiSettings;
use sq_service::FeedDefaults;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE: &str = "stack-quiz";
pub const ENV_PREFIX: &str = "STACK_QUIZ";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: Url,
    pub site: String,
    pub feed_filter: String,
    pub question_filter: String,
    pub answer_filter: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "secret")]
    pub api_key: Option<SecretString>,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub feed_size: i64,
    pub feed_min_answers: i64,
    pub feed_accepted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let api = ApiSettings::default();
        let feed = FeedDefaults::default();
        Self {
            base_url: api.base_url,
            site: api.site,
            feed_filter: api.feed_filter,
            question_filter: api.question_filter,
            answer_filter: api.answer_filter,
            timeout_secs: 10,
            user_agent: None,
            api_key: None,
            log_filter: "stack_quiz=info,sq_service=info,sq_http_reqwest=info".to_string(),
            log_format: LogFormat::default(),
            feed_size: feed.num_questions,
            feed_min_answers: feed.min_answers,
            feed_accepted: feed.is_accepted,
        }
    }
}

impl Settings {
    /// Reads the config file (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.site.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "site",
                reason: "must not be empty".to_string(),
            });
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "base_url",
                reason: format!("unsupported scheme `{}`", self.base_url.scheme()),
            });
        }
        Ok(())
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            site: self.site.clone(),
            feed_filter: self.feed_filter.clone(),
            question_filter: self.question_filter.clone(),
            answer_filter: self.answer_filter.clone(),
            api_key: self
                .api_key
                .as_ref()
                .map(|key| SecretString::from(key.expose_secret().to_owned())),
            ..ApiSettings::new(self.base_url.clone())
        }
    }

    pub fn feed_defaults(&self) -> FeedDefaults {
        FeedDefaults {
            num_questions: self.feed_size,
            min_answers: self.feed_min_answers,
            is_accepted: self.feed_accepted,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Loads `.env` from the working directory or its parents, if present.
/// Runs before logging is set up, so failures are returned for the caller
/// to report.
pub fn load_env_file() -> Result<Option<PathBuf>, ConfigError> {
    env_file_outcome(dotenvy::dotenv())
}

fn env_file_outcome(
    result: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, ConfigError> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|key| !key.is_empty()).map(SecretString::from))
}
