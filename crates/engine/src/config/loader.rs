use std::collections::HashMap;
use std::path::{Path, PathBuf};

use giftwise_common::config::SystemConfig;
use serde_json::Value;

use super::validation;

/// Prompt template used as the system message for gift sessions.
pub const GIFT_ADVISOR_PROMPT: &str = "gift_advisor";

/// Complete engine configuration loaded from the config directory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parsed system.toml, with environment overrides applied.
    pub system: SystemConfig,
    /// Tool declarations keyed by file stem (e.g. "analyzeGiftDate").
    pub tool_schemas: HashMap<String, Value>,
    /// Prompt templates keyed by filename stem (e.g. "gift_advisor").
    pub prompts: HashMap<String, String>,
}

impl EngineConfig {
    pub fn gift_advisor_prompt(&self) -> Option<&str> {
        self.prompts.get(GIFT_ADVISOR_PROMPT).map(String::as_str)
    }
}

/// Load all configuration from the given config directory.
///
/// Fails loudly with clear error messages if anything is misconfigured.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    // 1. Load and parse system.toml
    let system_path = config_dir.join("system.toml");
    let mut system = load_system_config(&system_path)?;
    apply_env_overrides(&mut system, |key| std::env::var(key).ok());

    // 2. Load tool declarations from config/tools/*.json
    let tool_schemas = load_tool_schemas(&config_dir.join("tools"))?;

    // 3. Load prompt templates from config/prompts/*.md
    let prompts = load_prompts(&config_dir.join("prompts"))?;

    let config = EngineConfig {
        system,
        tool_schemas,
        prompts,
    };

    // 4. Validate everything
    validation::validate(&config)?;

    tracing::info!(
        tool_schemas = config.tool_schemas.len(),
        prompts = config.prompts.len(),
        model = %config.system.llm.model,
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn load_system_config(path: &Path) -> Result<SystemConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Environment variables take precedence over system.toml for deployment
/// specific values.
fn apply_env_overrides(system: &mut SystemConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(port) = var("GIFTWISE_PORT").and_then(|p| p.parse().ok()) {
        system.server.port = port;
    }
    if let Some(url) = var("OLLAMA_URL").filter(|s| !s.is_empty()) {
        system.llm.base_url = url;
    }
    if let Some(model) = var("OLLAMA_MODEL").filter(|s| !s.is_empty()) {
        system.llm.model = model;
    }
}

fn load_tool_schemas(tools_dir: &Path) -> Result<HashMap<String, Value>, ConfigError> {
    let mut schemas = HashMap::new();

    if !tools_dir.exists() {
        tracing::warn!(
            path = %tools_dir.display(),
            "Tools directory does not exist, no tool schemas loaded"
        );
        return Ok(schemas);
    }

    let entries = std::fs::read_dir(tools_dir).map_err(|e| ConfigError::FileRead {
        path: tools_dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::FileRead {
            path: tools_dir.to_path_buf(),
            source: e,
        })?;

        let file_path = entry.path();
        if file_path.extension().is_some_and(|ext| ext == "json") {
            let tool_name = file_path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            let content = std::fs::read_to_string(&file_path).map_err(|e| ConfigError::FileRead {
                path: file_path.clone(),
                source: e,
            })?;

            let schema: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: file_path.clone(),
                detail: e.to_string(),
            })?;

            tracing::debug!(tool = %tool_name, "Loaded tool schema");
            schemas.insert(tool_name, schema);
        }
    }

    Ok(schemas)
}

fn load_prompts(prompts_dir: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let mut prompts = HashMap::new();

    if !prompts_dir.exists() {
        tracing::warn!(
            path = %prompts_dir.display(),
            "Prompts directory does not exist, no prompts loaded"
        );
        return Ok(prompts);
    }

    let entries = std::fs::read_dir(prompts_dir).map_err(|e| ConfigError::FileRead {
        path: prompts_dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::FileRead {
            path: prompts_dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if path
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "txt")
        {
            let name = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
                path: path.clone(),
                source: e,
            })?;

            tracing::debug!(prompt = %name, "Loaded prompt template");
            prompts.insert(name, content);
        }
    }

    Ok(prompts)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for giftwise_common::GiftwiseError {
    fn from(e: ConfigError) -> Self {
        giftwise_common::GiftwiseError::Config(e.to_string())
    }
}
