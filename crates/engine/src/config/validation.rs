use super::loader::{ConfigError, EngineConfig, GIFT_ADVISOR_PROMPT};
use crate::tools::handlers::ANALYZE_GIFT_DATE;

/// Validate the complete engine configuration.
///
/// Checks sane ranges on numeric parameters and that the prompt and tool
/// declaration the engine depends on were loaded. Every problem is
/// reported in one error.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_llm(config, &mut errors);
    validate_orchestration(config, &mut errors);
    validate_retry(config, &mut errors);
    validate_assets(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_llm(config: &EngineConfig, errors: &mut Vec<String>) {
    let l = &config.system.llm;

    if l.provider != "ollama" {
        errors.push(format!("llm.provider '{}' is not supported", l.provider));
    }
    if l.base_url.is_empty() {
        errors.push("llm.base_url must not be empty".into());
    }
    if l.model.is_empty() {
        errors.push("llm.model must not be empty".into());
    }
    if l.request_timeout_seconds == 0 {
        errors.push("llm.request_timeout_seconds must be > 0".into());
    }
    if let Some(temp) = l.temperature {
        if !(0.0..=2.0).contains(&temp) {
            errors.push("llm.temperature must be between 0.0 and 2.0".into());
        }
    }
}

fn validate_orchestration(config: &EngineConfig, errors: &mut Vec<String>) {
    let o = &config.system.orchestration;

    if o.max_rounds == 0 {
        errors.push("orchestration.max_rounds must be > 0".into());
    }
    if o.session_deadline_seconds == 0 {
        errors.push("orchestration.session_deadline_seconds must be > 0".into());
    }
}

fn validate_retry(config: &EngineConfig, errors: &mut Vec<String>) {
    let r = &config.system.retry.llm_api;

    if r.max_attempts == 0 {
        errors.push("retry.llm_api.max_attempts must be > 0".into());
    }
    if r.backoff_multiplier < 1.0 {
        errors.push("retry.llm_api.backoff_multiplier must be >= 1.0".into());
    }
    if r.initial_backoff_ms > r.max_backoff_ms {
        errors.push("retry.llm_api.initial_backoff_ms must be <= max_backoff_ms".into());
    }
}

fn validate_assets(config: &EngineConfig, errors: &mut Vec<String>) {
    if !config.prompts.contains_key(GIFT_ADVISOR_PROMPT) {
        errors.push(format!("prompts/{}.md is required", GIFT_ADVISOR_PROMPT));
    }
    if !config.tool_schemas.contains_key(ANALYZE_GIFT_DATE) {
        errors.push(format!("tools/{}.json is required", ANALYZE_GIFT_DATE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwise_common::config::{
        LlmConfig, OrchestrationLimits, RetryConfig, RetryDefaults, ServerConfig, SystemConfig,
    };
    use std::collections::HashMap;

    fn valid() -> EngineConfig {
        let mut prompts = HashMap::new();
        prompts.insert(GIFT_ADVISOR_PROMPT.to_string(), "sys".to_string());
        let mut tool_schemas = HashMap::new();
        tool_schemas.insert(ANALYZE_GIFT_DATE.to_string(), serde_json::json!({}));

        EngineConfig {
            system: SystemConfig {
                server: ServerConfig::default(),
                llm: LlmConfig {
                    provider: "ollama".into(),
                    base_url: "http://localhost:11434".into(),
                    model: "llama3.2".into(),
                    temperature: Some(0.7),
                    request_timeout_seconds: 60,
                },
                orchestration: OrchestrationLimits {
                    max_rounds: 6,
                    session_deadline_seconds: 180,
                },
                retry: RetryDefaults {
                    llm_api: RetryConfig {
                        max_attempts: 3,
                        initial_backoff_ms: 500,
                        max_backoff_ms: 5000,
                        backoff_multiplier: 2.0,
                        jitter: true,
                    },
                },
            },
            tool_schemas,
            prompts,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.system.orchestration.max_rounds = 0;
        config.system.llm.model = String::new();
        config.system.llm.temperature = Some(3.5);

        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("orchestration.max_rounds"));
        assert!(err.contains("llm.model"));
        assert!(err.contains("llm.temperature"));
    }

    #[test]
    fn test_unsupported_provider() {
        let mut config = valid();
        config.system.llm.provider = "openai".into();
        assert!(validate(&config).is_err());
    }
}
