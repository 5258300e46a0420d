use std::time::Duration;

use giftwise_common::types::{ToolCallRequest, ToolResult};
use giftwise_common::GiftwiseError;

use super::types::{LlmResponse, Message};
use super::{LlmCaller, LlmError};
use crate::tools::ToolRegistry;

/// Result of an orchestration run that reached a final answer.
#[derive(Clone, Debug)]
pub struct OrchestrationResult {
    /// Content of the last model response, verbatim.
    pub final_message_content: String,
    /// Executed tool calls, earliest first.
    pub tool_call_trail: Vec<ToolCallRequest>,
    /// Results of `tool_call_trail`, index-aligned.
    pub tool_result_trail: Vec<ToolResult>,
    pub stats: SessionStats,
}

/// Accumulated statistics for a run.
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub rounds: u32,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Simultaneous tool calls dropped because only the first is honored.
    pub discarded_tool_calls: u32,
}

/// Configuration for the tool-call loop.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Max model calls per run.
    pub max_rounds: u32,
    /// Deadline for the whole run.
    pub deadline: Option<Duration>,
}

/// Ways a run can end without a final answer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Model gateway failed on round {round}: {source}")]
    Gateway {
        round: u32,
        #[source]
        source: LlmError,
    },

    #[error("Model still requesting tools after {rounds} rounds")]
    ToolLoopExceeded { rounds: u32 },

    #[error("Session exceeded its {}s deadline", .deadline.as_secs())]
    DeadlineExceeded { deadline: Duration },
}

impl From<SessionError> for GiftwiseError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Gateway { source, .. } => source.into(),
            SessionError::ToolLoopExceeded { rounds } => GiftwiseError::ToolLoopExceeded { rounds },
            e @ SessionError::DeadlineExceeded { .. } => GiftwiseError::Timeout(e.to_string()),
        }
    }
}

/// Drive the tool-call loop until the model answers without requesting a
/// tool.
///
/// Each round sends the whole log plus the registry's declarations. When the
/// model requests a tool, only the first request is executed; the log grows
/// by exactly the assistant's tool-call message and the tool's result
/// message. A request for an unknown tool, or one whose arguments do not
/// decode, ends the run with that response's content as the final answer.
pub async fn run_session(
    llm: &dyn LlmCaller,
    initial_messages: Vec<Message>,
    registry: &ToolRegistry,
    config: &SessionConfig,
) -> Result<OrchestrationResult, SessionError> {
    let rounds = run_rounds(llm, initial_messages, registry, config.max_rounds);

    match config.deadline {
        Some(deadline) => match tokio::time::timeout(deadline, rounds).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(deadline_s = deadline.as_secs(), "Session hit deadline");
                Err(SessionError::DeadlineExceeded { deadline })
            }
        },
        None => rounds.await,
    }
}

async fn run_rounds(
    llm: &dyn LlmCaller,
    initial_messages: Vec<Message>,
    registry: &ToolRegistry,
    max_rounds: u32,
) -> Result<OrchestrationResult, SessionError> {
    let mut log = initial_messages;
    let mut tool_call_trail = Vec::new();
    let mut tool_result_trail = Vec::new();
    let mut stats = SessionStats::default();

    loop {
        if stats.rounds >= max_rounds {
            tracing::warn!(rounds = stats.rounds, "Session hit max rounds limit");
            return Err(SessionError::ToolLoopExceeded {
                rounds: stats.rounds,
            });
        }

        stats.rounds += 1;
        let round = stats.rounds;

        let LlmResponse {
            content,
            tool_calls,
            usage,
        } = llm
            .chat(&log, registry.definitions())
            .await
            .map_err(|source| {
                tracing::error!(round, error = %source, "LLM API error during session");
                SessionError::Gateway { round, source }
            })?;

        stats.total_input_tokens += usage.input_tokens;
        stats.total_output_tokens += usage.output_tokens;

        let mut requested = tool_calls.into_iter();
        let Some(call) = requested.next() else {
            tracing::debug!(round, "Model answered without tool call");
            return Ok(OrchestrationResult {
                final_message_content: content,
                tool_call_trail,
                tool_result_trail,
                stats,
            });
        };

        let discarded = requested.count() as u32;
        if discarded > 0 {
            tracing::debug!(round, discarded, "Discarding simultaneous tool calls");
            stats.discarded_tool_calls += discarded;
        }

        let result = match registry.dispatch(&call).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(round, error = %e, "Tool call not executed, ending session");
                return Ok(OrchestrationResult {
                    final_message_content: content,
                    tool_call_trail,
                    tool_result_trail,
                    stats,
                });
            }
        };

        tracing::info!(round, tool = %call.tool_name, "Tool round completed");

        log = extend_log(log, content, call.clone(), &result);
        tool_call_trail.push(call);
        tool_result_trail.push(result);
    }
}

/// The next round's log: the previous log followed by the assistant's
/// tool-call message and the tool's result message.
fn extend_log(
    mut log: Vec<Message>,
    assistant_content: String,
    call: ToolCallRequest,
    result: &ToolResult,
) -> Vec<Message> {
    log.reserve(2);
    log.push(Message::assistant_tool_call(assistant_content, call));
    log.push(Message::tool_result(result));
    log
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
