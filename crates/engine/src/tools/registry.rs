use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use giftwise_common::types::{ToolCallRequest, ToolResult};

use crate::date_context::Clock;
use crate::llm::types::ToolDefinition;

/// Shared context available to all tool handlers.
pub struct ToolHandlerContext {
    pub clock: Arc<dyn Clock>,
}

/// Errors from dispatching a tool call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {detail}")]
    InvalidArguments { tool: String, detail: String },

    #[error("Tool '{tool}' failed: {detail}")]
    Execution { tool: String, detail: String },
}

/// Handler function signature: takes decoded-at-the-edge JSON arguments and
/// context, returns a JSON payload or an error.
pub type ToolHandler = Arc<
    dyn Fn(
            Map<String, Value>,
            Arc<ToolHandlerContext>,
        ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>
        + Send
        + Sync,
>;

/// Registry of tool handlers with their declarations.
///
/// Built once at startup and shared read-only behind an `Arc`.
pub struct ToolRegistry {
    handlers: HashMap<String, ToolHandler>,
    definitions: Vec<ToolDefinition>,
    context: Arc<ToolHandlerContext>,
}

impl ToolRegistry {
    pub fn new(context: ToolHandlerContext) -> Self {
        Self {
            handlers: HashMap::new(),
            definitions: Vec::new(),
            context: Arc::new(context),
        }
    }

    /// Register a tool handler by name.
    pub fn register(&mut self, name: &str, handler: ToolHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Load tool declarations from config-loaded schemas and check that
    /// declarations and handlers pair up one-to-one.
    pub fn load_definitions(&mut self, tool_schemas: &HashMap<String, Value>) -> Result<(), String> {
        let mut keys: Vec<_> = tool_schemas.keys().collect();
        keys.sort();

        for key in keys {
            let schema = &tool_schemas[key];

            let name = schema
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("Tool schema '{}' missing 'name' field", key))?
                .to_string();

            let description = schema
                .get("description")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("Tool schema '{}' missing 'description' field", key))?
                .to_string();

            let input_schema = schema
                .get("input_schema")
                .cloned()
                .ok_or_else(|| format!("Tool schema '{}' missing 'input_schema' field", key))?;

            if !self.handlers.contains_key(&name) {
                return Err(format!("Tool schema '{}' declares '{}' but no handler is registered", key, name));
            }

            self.definitions.push(ToolDefinition {
                name,
                description,
                input_schema,
            });
        }

        for name in self.handlers.keys() {
            if !self.definitions.iter().any(|d| &d.name == name) {
                return Err(format!("Tool handler '{}' has no schema declaration", name));
            }
        }

        tracing::info!(tools = self.definitions.len(), "Loaded tool definitions");

        Ok(())
    }

    /// Get the tool declarations for sending to the LLM.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Execute a tool call by name.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<ToolResult, ToolError> {
        let name = call.tool_name.as_str();
        let start = std::time::Instant::now();

        let handler = match self.handlers.get(name) {
            Some(h) => h,
            None => {
                tracing::warn!(tool = %name, "Unknown tool called");
                metrics::counter!("tools.execution.errors", "tool" => name.to_string())
                    .increment(1);
                return Err(ToolError::UnknownTool(name.to_string()));
            }
        };

        tracing::info!(tool = %name, "Tool call started");

        let result = handler(call.arguments.clone(), Arc::clone(&self.context)).await;

        let latency = start.elapsed().as_secs_f64();
        metrics::histogram!("tools.execution.latency", "tool" => name.to_string()).record(latency);
        metrics::counter!("tools.execution.count", "tool" => name.to_string()).increment(1);

        match result {
            Ok(payload) => {
                tracing::info!(tool = %name, latency_s = latency, "Tool call succeeded");
                Ok(ToolResult {
                    tool_name: name.to_string(),
                    payload,
                })
            }
            Err(e) => {
                tracing::warn!(tool = %name, latency_s = latency, error = %e, "Tool call failed");
                metrics::counter!("tools.execution.errors", "tool" => name.to_string())
                    .increment(1);
                Err(e)
            }
        }
    }
}
