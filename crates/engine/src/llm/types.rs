use serde::{Deserialize, Serialize};
use serde_json::Value;

use giftwise_common::types::{ToolCallRequest, ToolResult};

/// A message in the conversation log.
///
/// The log is append-only within a run and replayed to the model verbatim
/// on every round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set on `tool` messages: which tool produced this content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Set on assistant messages that requested a tool.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Assistant turn that requested `call`. Only the executed call is
    /// recorded, so the replayed log never references discarded calls.
    pub fn assistant_tool_call(content: impl Into<String>, call: ToolCallRequest) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_name: None,
            tool_calls: vec![call],
        }
    }

    /// Tool-role message carrying a serialized tool result.
    pub fn tool_result(result: &ToolResult) -> Self {
        let content = serde_json::to_string(&result.payload).unwrap_or_else(|e| {
            format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
        });
        Self {
            role: Role::Tool,
            content,
            tool_name: Some(result.tool_name.clone()),
            tool_calls: Vec::new(),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            tool_calls: Vec::new(),
        }
    }
}

/// Conversation role (matches Ollama wire format).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool declaration sent to the LLM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
}

/// Parsed response from a model gateway call.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    /// Tool calls in the order the model returned them.
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: TokenUsage,
}

/// Token usage from a single API call.
#[derive(Clone, Debug, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
