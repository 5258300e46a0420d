use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub orchestration: OrchestrationLimits,
    pub retry: RetryDefaults,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            allowed_origins: Vec::new(),
        }
    }
}

/// Model gateway configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name. Only "ollama" is supported.
    pub provider: String,
    /// Base URL of the model server (e.g. "http://golem:11434").
    pub base_url: String,
    /// Model identifier (e.g. "gpt-oss:120b").
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Deadline for a single gateway call.
    pub request_timeout_seconds: u64,
}

/// Bounds on a single orchestration run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestrationLimits {
    /// Max model calls per run. A run still requesting tools on the last
    /// allowed round fails with a tool loop error.
    pub max_rounds: u32,
    /// Deadline for the whole run, across all rounds.
    pub session_deadline_seconds: u64,
}

/// Retry parameters per target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryDefaults {
    pub llm_api: RetryConfig,
}

/// Retry configuration for a specific target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}
