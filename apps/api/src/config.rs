use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use secrecy::Secret;

use crate::llm_client::{LlmConfig, DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Fails at startup on malformed values. The completion credential is optional:
/// without it every interviewer turn reports a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion_api_key: Option<Secret<String>>,
    pub completion_api_url: String,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
    /// Questions asked before the interviewer switches to the evaluation.
    pub question_limit: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            completion_api_key: None,
            completion_api_url: DEFAULT_API_URL.to_string(),
            completion_model: DEFAULT_MODEL.to_string(),
            completion_timeout_secs: 30,
            question_limit: 10,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let config = Config {
            completion_api_key: lookup("GROQ_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new),
            completion_api_url: lookup("COMPLETION_API_URL")
                .unwrap_or(defaults.completion_api_url),
            completion_model: lookup("COMPLETION_MODEL").unwrap_or(defaults.completion_model),
            completion_timeout_secs: parse_env(
                &lookup,
                "COMPLETION_TIMEOUT_SECS",
                defaults.completion_timeout_secs,
            )?,
            question_limit: parse_env(
                &lookup,
                "INTERVIEW_QUESTION_LIMIT",
                defaults.question_limit,
            )?,
            port: parse_env(&lookup, "PORT", defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        };

        ensure!(
            config.question_limit >= 1,
            "INTERVIEW_QUESTION_LIMIT must be at least 1"
        );
        ensure!(
            config.completion_timeout_secs >= 1,
            "COMPLETION_TIMEOUT_SECS must be at least 1"
        );

        Ok(config)
    }

    /// Settings for the completion client.
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::new(self.completion_api_key.clone())
            .with_api_url(self.completion_api_url.clone())
            .with_model(self.completion_model.clone())
            .with_timeout(Duration::from_secs(self.completion_timeout_secs))
    }
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
