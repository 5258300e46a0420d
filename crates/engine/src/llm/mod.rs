mod ollama;
pub mod session;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use giftwise_common::config::{LlmConfig, RetryConfig};

pub use types::{LlmResponse, Message, Role, TokenUsage, ToolDefinition};

/// Model gateway client with provider dispatch and retry logic.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    retry_config: RetryConfig,
}

/// Errors from model gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM HTTP error: {0}")]
    Http(String),

    #[error("LLM request timed out: {0}")]
    Timeout(String),

    #[error("LLM rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM response parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Transport-level failures are retried; a malformed body or a client
    /// error will fail the same way again.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Timeout(_) | LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Parse(_) => false,
        }
    }
}

impl From<LlmError> for giftwise_common::GiftwiseError {
    fn from(e: LlmError) -> Self {
        giftwise_common::GiftwiseError::LlmApi(e.to_string())
    }
}

impl LlmClient {
    /// Create a new client for the configured provider.
    pub fn new(config: LlmConfig, retry_config: RetryConfig) -> Result<Self, LlmError> {
        if config.provider != "ollama" {
            return Err(LlmError::Api {
                status: 0,
                message: format!("Unknown provider: {}", config.provider),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| LlmError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            retry_config,
        })
    }

    /// Send a chat request with retry on transport failures.
    pub async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        let mut attempt = 0u32;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;
            let result = self.send_once(messages, tools).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() || attempt >= self.retry_config.max_attempts => {
                    metrics::counter!("llm.api.errors", "provider" => self.config.provider.clone())
                        .increment(1);
                    return Err(e);
                }
                Err(LlmError::RateLimited { retry_after }) => {
                    let wait =
                        rate_limit_wait(retry_after, backoff_ms, self.retry_config.max_backoff_ms);
                    tracing::warn!(attempt, wait_ms = wait, "LLM rate limited, retrying");
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                }
                Err(e) => {
                    let jitter = if self.retry_config.jitter {
                        compute_jitter(attempt, backoff_ms)
                    } else {
                        0
                    };
                    let wait = backoff_ms + jitter;
                    tracing::warn!(attempt, wait_ms = wait, error = %e, "LLM API error, retrying");
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                    backoff_ms = (backoff_ms as f64 * self.retry_config.backoff_multiplier) as u64;
                    backoff_ms = backoff_ms.min(self.retry_config.max_backoff_ms);
                }
            }
        }
    }

    async fn send_once(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        ollama::send_chat(
            &self.http,
            &self.config.base_url,
            &self.config.model,
            self.config.temperature,
            messages,
            tools,
        )
        .await
    }
}

/// Wait before retrying a 429. The server's `Retry-After` wins over our own
/// backoff but is still capped at `max_backoff_ms`.
fn rate_limit_wait(retry_after: Option<u64>, backoff_ms: u64, max_backoff_ms: u64) -> u64 {
    retry_after
        .map(|secs| secs.saturating_mul(1000))
        .unwrap_or(backoff_ms)
        .min(max_backoff_ms)
}

/// Compute jitter for retry backoff using simple hash-based approach.
fn compute_jitter(attempt: u32, backoff_ms: u64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    attempt.hash(&mut hasher);
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        .hash(&mut hasher);
    hasher.finish() % (backoff_ms / 2 + 1)
}

/// Object-safe gateway seam. Production uses `LlmClient`; tests script
/// responses with a mock.
pub trait LlmCaller: Send + Sync {
    fn chat<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>>;
}

impl LlmCaller for LlmClient {
    fn chat<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(messages, tools))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const OK_BODY: &str = r#"{"message": {"role": "assistant", "content": "{\"gifts\": []}"}, "done": true}"#;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            temperature: None,
            request_timeout_seconds: 30,
        }
    }

    fn retry_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 100,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_retry_classification() {
        assert!(LlmError::Http("connection reset".into()).is_retryable());
        assert!(LlmError::Timeout("30s".into()).is_retryable());
        assert!(LlmError::RateLimited { retry_after: None }.is_retryable());
        assert!(LlmError::Api {
            status: 503,
            message: "loading model".into()
        }
        .is_retryable());
        assert!(!LlmError::Api {
            status: 404,
            message: "model not found".into()
        }
        .is_retryable());
        assert!(!LlmError::Parse("bad body".into()).is_retryable());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(LlmClient::new(llm_config("anthropic"), retry_config()).is_err());
        assert!(LlmClient::new(llm_config("ollama"), retry_config()).is_ok());
    }

    fn http_reply(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    /// Serve scripted replies, one connection per request. The last reply
    /// repeats once the script runs out.
    async fn spawn_gateway(replies: Vec<String>) -> (String, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
                let reply = replies[n.min(replies.len() - 1)].clone();
                read_request(&mut socket).await;
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn client_for(base_url: String) -> LlmClient {
        let mut config = llm_config("ollama");
        config.base_url = base_url;
        LlmClient::new(config, retry_config()).unwrap()
    }

    #[tokio::test]
    async fn test_chat_retries_server_error_then_succeeds() {
        let (url, hits) = spawn_gateway(vec![
            http_reply("503 Service Unavailable", "", r#"{"error": "model loading"}"#),
            http_reply("200 OK", "", OK_BODY),
        ])
        .await;

        let response = client_for(url).chat(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(response.content, r#"{"gifts": []}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_chat_does_not_retry_client_error() {
        let (url, hits) = spawn_gateway(vec![http_reply(
            "404 Not Found",
            "",
            r#"{"error": "model 'llama3.2' not found"}"#,
        )])
        .await;

        let err = client_for(url).chat(&[Message::user("hi")], &[]).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("not found"));
            }
            other => panic!("Expected Api, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chat_does_not_retry_malformed_body() {
        let (url, hits) = spawn_gateway(vec![http_reply("200 OK", "", "not json")]).await;

        let err = client_for(url).chat(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chat_stops_at_max_attempts() {
        let (url, hits) = spawn_gateway(vec![http_reply(
            "503 Service Unavailable",
            "",
            r#"{"error": "overloaded"}"#,
        )])
        .await;

        let err = client_for(url).chat(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), retry_config().max_attempts);
    }

    #[tokio::test]
    async fn test_chat_caps_huge_retry_after() {
        let (url, hits) = spawn_gateway(vec![
            http_reply("429 Too Many Requests", "retry-after: 18446744073709551615\r\n", "{}"),
            http_reply("200 OK", "", OK_BODY),
        ])
        .await;

        let response = tokio::time::timeout(
            Duration::from_secs(5),
            client_for(url).chat(&[Message::user("hi")], &[]),
        )
        .await
        .expect("retry wait should be capped at max_backoff_ms")
        .unwrap();
        assert_eq!(response.content, r#"{"gifts": []}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rate_limit_wait_is_capped() {
        assert_eq!(rate_limit_wait(Some(u64::MAX), 10, 100), 100);
        assert_eq!(rate_limit_wait(Some(2), 10, 8000), 2000);
        assert_eq!(rate_limit_wait(None, 10, 100), 10);
    }

    #[test]
    fn test_jitter_bounded_by_half_backoff() {
        for attempt in 1..10 {
            assert!(compute_jitter(attempt, 1000) <= 500);
        }
    }
}
