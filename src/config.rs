use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::api::ApiLatency;
use crate::language::Language;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Simulated latencies of the in-memory API, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub question_list_ms: u64,
    pub question_fetch_ms: u64,
    pub submit_ms: u64,
    pub evaluate_ms: u64,
    pub history_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            question_list_ms: 600,
            question_fetch_ms: 300,
            submit_ms: 2000,
            evaluate_ms: 3000,
            history_ms: 500,
        }
    }
}

impl ApiConfig {
    pub fn latency(&self) -> ApiLatency {
        ApiLatency {
            question_list: Duration::from_millis(self.question_list_ms),
            question_fetch: Duration::from_millis(self.question_fetch_ms),
            submit: Duration::from_millis(self.submit_ms),
            evaluate: Duration::from_millis(self.evaluate_ms),
            history: Duration::from_millis(self.history_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub submission_timeout_secs: u64,
    pub default_language: Language,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            submission_timeout_secs: 30,
            default_language: Language::En,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub acquire_latency_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            acquire_latency_ms: 200,
        }
    }
}

impl Config {
    /// Load from a config file (extension optional) with `MOCK_INTERVIEW__*` env overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("MOCK_INTERVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}
