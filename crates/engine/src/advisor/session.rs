use std::sync::Arc;
use std::time::Duration;

use giftwise_common::config::OrchestrationLimits;
use giftwise_common::types::{GiftRecommendation, GiftRequest, ToolCallRequest, ToolResult};
use giftwise_common::GiftwiseError;
use uuid::Uuid;

use super::parser::{parse_gift_response, MalformedModelOutput};
use super::prompt::build_initial_messages;
use crate::llm::session::{run_session, SessionConfig};
use crate::llm::LlmCaller;
use crate::tools::ToolRegistry;

/// How a gift request ended when the model produced a final answer.
#[derive(Clone, Debug)]
pub enum AdvisorOutcome {
    Gifts {
        gifts: Vec<GiftRecommendation>,
        tool_calls: Vec<ToolCallRequest>,
        tool_results: Vec<ToolResult>,
    },
    /// The final answer did not decode as gift JSON.
    Unparseable(MalformedModelOutput),
}

/// Turns a validated gift request into ranked suggestions by driving the
/// tool-call loop and decoding the final answer.
///
/// Holds no per-request state; one instance serves all requests.
pub struct GiftAdvisorSession {
    llm: Arc<dyn LlmCaller>,
    tool_registry: Arc<ToolRegistry>,
    system_prompt: String,
    session_config: SessionConfig,
}

impl GiftAdvisorSession {
    pub fn new(
        llm: Arc<dyn LlmCaller>,
        tool_registry: Arc<ToolRegistry>,
        system_prompt: String,
        limits: &OrchestrationLimits,
    ) -> Self {
        let session_config = SessionConfig {
            max_rounds: limits.max_rounds,
            deadline: Some(Duration::from_secs(limits.session_deadline_seconds)),
        };

        Self {
            llm,
            tool_registry,
            system_prompt,
            session_config,
        }
    }

    /// Run one stateless orchestration for `request`.
    ///
    /// Gateway failures are returned as errors; an unparseable answer is an
    /// `Ok(AdvisorOutcome::Unparseable)`.
    pub async fn run(&self, request: &GiftRequest) -> Result<AdvisorOutcome, GiftwiseError> {
        let request_id = Uuid::new_v4();
        let start = std::time::Instant::now();

        tracing::info!(
            request_id = %request_id,
            occasion = %request.occasion,
            has_gift_date = request.gift_date.is_some(),
            "Gift session started"
        );

        let initial_messages = build_initial_messages(&self.system_prompt, request);

        let result = run_session(
            self.llm.as_ref(),
            initial_messages,
            &self.tool_registry,
            &self.session_config,
        )
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "Gift session failed");
            metrics::counter!("gifts.outcome", "outcome" => "failed").increment(1);
            GiftwiseError::from(e)
        })?;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("gifts.session.duration").record(duration);
        metrics::histogram!("orchestrator.rounds").record(result.stats.rounds as f64);

        let outcome = match parse_gift_response(&result.final_message_content) {
            Ok(gifts) => {
                tracing::info!(
                    request_id = %request_id,
                    duration_s = duration,
                    rounds = result.stats.rounds,
                    tool_calls = result.tool_call_trail.len(),
                    gifts = gifts.len(),
                    input_tokens = result.stats.total_input_tokens,
                    output_tokens = result.stats.total_output_tokens,
                    "Gift session completed"
                );
                metrics::counter!("gifts.outcome", "outcome" => "success").increment(1);
                AdvisorOutcome::Gifts {
                    gifts,
                    tool_calls: result.tool_call_trail,
                    tool_results: result.tool_result_trail,
                }
            }
            Err(malformed) => {
                tracing::warn!(
                    request_id = %request_id,
                    rounds = result.stats.rounds,
                    error = %malformed,
                    raw_len = malformed.raw.len(),
                    "Could not parse model response"
                );
                metrics::counter!("gifts.outcome", "outcome" => "unparseable").increment(1);
                AdvisorOutcome::Unparseable(malformed)
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_context::FixedClock;
    use crate::llm::types::{LlmResponse, Message, TokenUsage, ToolDefinition};
    use crate::llm::LlmError;
    use crate::tools::handlers::{register_gift_tools, ANALYZE_GIFT_DATE};
    use crate::tools::ToolHandlerContext;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct MockLlm {
        responses: Mutex<Vec<Result<LlmResponse, LlmError>>>,
    }

    impl MockLlm {
        fn new(mut responses: Vec<Result<LlmResponse, LlmError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl LlmCaller for MockLlm {
        fn chat<'a>(
            &'a self,
            _messages: &'a [Message],
            _tools: &'a [ToolDefinition],
        ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>> {
            let result = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LlmError::Http("script exhausted".into())));
            Box::pin(async move { result })
        }
    }

    fn text(content: String) -> LlmResponse {
        LlmResponse {
            content,
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    fn five_gifts() -> String {
        let gifts: Vec<_> = (1..=5)
            .map(|i| {
                json!({
                    "name": format!("Gift {}", i),
                    "description": "Something nice",
                    "fit_score": 100 - i * 5,
                    "reasoning": "Fits the summer date"
                })
            })
            .collect();
        json!({ "gifts": gifts }).to_string()
    }

    fn session(llm: MockLlm) -> GiftAdvisorSession {
        let mut registry = ToolRegistry::new(ToolHandlerContext {
            clock: Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())),
        });
        register_gift_tools(&mut registry);
        let mut schemas = HashMap::new();
        schemas.insert(
            ANALYZE_GIFT_DATE.to_string(),
            json!({
                "name": ANALYZE_GIFT_DATE,
                "description": "Analyze a gift date",
                "input_schema": {"type": "object"}
            }),
        );
        registry.load_definitions(&schemas).unwrap();

        GiftAdvisorSession::new(
            Arc::new(llm),
            Arc::new(registry),
            "You are a gift advisor.".into(),
            &OrchestrationLimits {
                max_rounds: 6,
                session_deadline_seconds: 60,
            },
        )
    }

    fn request() -> GiftRequest {
        GiftRequest {
            name: "Maya".into(),
            age: 34,
            hobbies: Some("surfing".into()),
            occasion: "birthday".into(),
            gift_date: Some("2025-07-04".into()),
        }
    }

    #[tokio::test]
    async fn test_date_tool_then_gifts() {
        let llm = MockLlm::new(vec![
            Ok(LlmResponse {
                content: String::new(),
                tool_calls: vec![ToolCallRequest {
                    tool_name: ANALYZE_GIFT_DATE.into(),
                    arguments: json!({"giftDate": "2025-07-04"}).as_object().cloned().unwrap(),
                }],
                usage: TokenUsage::default(),
            }),
            Ok(text(five_gifts())),
        ]);

        match session(llm).run(&request()).await.unwrap() {
            AdvisorOutcome::Gifts {
                gifts,
                tool_calls,
                tool_results,
            } => {
                assert_eq!(gifts.len(), 5);
                assert_eq!(gifts[0].name, "Gift 1");
                assert_eq!(gifts[0].fit_score, 95);
                assert_eq!(tool_calls.len(), 1);
                assert_eq!(tool_results.len(), 1);
                assert_eq!(tool_results[0].payload["season"], "summer");
            }
            other => panic!("Expected Gifts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_recoverable_outcome() {
        let llm = MockLlm::new(vec![Ok(text("not json".into()))]);

        match session(llm).run(&request()).await.unwrap() {
            AdvisorOutcome::Unparseable(malformed) => assert_eq!(malformed.raw, "not json"),
            other => panic!("Expected Unparseable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gateway_failure_is_fatal_error() {
        let llm = MockLlm::new(vec![Err(LlmError::Api {
            status: 500,
            message: "model crashed".into(),
        })]);

        let err = session(llm).run(&request()).await.unwrap_err();
        assert!(matches!(err, GiftwiseError::LlmApi(_)));
        assert!(!err.is_recoverable());
    }
}
