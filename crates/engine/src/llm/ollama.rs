use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use giftwise_common::types::ToolCallRequest;

use super::types::{LlmResponse, Message, TokenUsage, ToolDefinition};
use super::LlmError;

// ---------------------------------------------------------------------------
// Request wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Serialize)]
struct ChatTool {
    r#type: &'static str,
    function: ChatFunction,
}

#[derive(Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize, Deserialize)]
struct ChatToolCall {
    function: ChatToolCallFunction,
}

#[derive(Serialize, Deserialize)]
struct ChatToolCallFunction {
    name: String,
    /// An object on current servers; some builds send a JSON-encoded string.
    #[serde(default)]
    arguments: Value,
}

// ---------------------------------------------------------------------------
// Response wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn to_wire_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ChatToolCall {
                    function: ChatToolCallFunction {
                        name: call.tool_name.clone(),
                        arguments: Value::Object(call.arguments.clone()),
                    },
                })
                .collect(),
            tool_name: msg.tool_name.clone(),
        })
        .collect()
}

fn to_wire_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|t| ChatTool {
            r#type: "function",
            function: ChatFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            },
        })
        .collect()
}

fn decode_arguments(arguments: Value) -> Map<String, Value> {
    match arguments {
        Value::Object(map) => map,
        Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn from_wire_response(resp: ChatResponse) -> LlmResponse {
    let tool_calls = resp
        .message
        .tool_calls
        .into_iter()
        .map(|tc| ToolCallRequest {
            tool_name: tc.function.name,
            arguments: decode_arguments(tc.function.arguments),
        })
        .collect();

    LlmResponse {
        content: resp.message.content,
        tool_calls,
        usage: TokenUsage {
            input_tokens: resp.prompt_eval_count.unwrap_or(0),
            output_tokens: resp.eval_count.unwrap_or(0),
        },
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Send a non-streaming chat request to an Ollama server.
pub async fn send_chat(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    temperature: Option<f64>,
    messages: &[Message],
    tools: &[ToolDefinition],
) -> Result<LlmResponse, LlmError> {
    let start = std::time::Instant::now();
    let url = format!("{}/api/chat", base_url.trim_end_matches('/'));

    let request = ChatRequest {
        model,
        messages: to_wire_messages(messages),
        tools: to_wire_tools(tools),
        stream: false,
        options: temperature.map(|temperature| ChatOptions { temperature }),
    };

    let response = http.post(&url).json(&request).send().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else {
            LlmError::Http(e.to_string())
        }
    })?;

    let status = response.status();
    let latency = start.elapsed().as_secs_f64();
    metrics::histogram!("llm.api.latency", "provider" => "ollama", "model" => model.to_string())
        .record(latency);

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(LlmError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<OllamaError>(&body) {
            Ok(e) => e.error,
            Err(_) => body,
        };
        return Err(LlmError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|e| LlmError::Parse(format!("Failed to parse Ollama response: {}", e)))?;

    let llm_response = from_wire_response(body);

    metrics::counter!("llm.api.input_tokens", "provider" => "ollama")
        .increment(llm_response.usage.input_tokens);
    metrics::counter!("llm.api.output_tokens", "provider" => "ollama")
        .increment(llm_response.usage.output_tokens);

    Ok(llm_response)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
