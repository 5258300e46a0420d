pub mod handlers;
pub mod registry;

pub use registry::{ToolError, ToolHandler, ToolHandlerContext, ToolRegistry};
