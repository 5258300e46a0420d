use thiserror::Error;

/// Top-level error type for Giftwise operations.
#[derive(Debug, Error)]
pub enum GiftwiseError {
    // --- Request errors (orchestrator never invoked) ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- Hard dependency errors (request cannot complete) ---
    #[error("LLM API error: {0}")]
    LlmApi(String),

    // --- Recoverable orchestration errors ---
    #[error("Tool loop exceeded after {rounds} rounds")]
    ToolLoopExceeded { rounds: u32 },

    #[error("Timeout: {0}")]
    Timeout(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl GiftwiseError {
    /// Whether this error is reported to the caller as a well-formed
    /// `success: false` body rather than a transport-level failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ToolLoopExceeded { .. } | Self::Timeout(_)
        )
    }
}

/// Result type alias for Giftwise operations.
pub type Result<T> = std::result::Result<T, GiftwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(GiftwiseError::ToolLoopExceeded { rounds: 6 }.is_recoverable());
        assert!(GiftwiseError::Timeout("session".into()).is_recoverable());
        assert!(GiftwiseError::Validation("missing age".into()).is_recoverable());
        assert!(!GiftwiseError::LlmApi("connection refused".into()).is_recoverable());
        assert!(!GiftwiseError::Internal("boom".into()).is_recoverable());
    }
}
