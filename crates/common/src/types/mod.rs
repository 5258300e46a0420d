mod date_analysis;
mod gift;
mod tool_call;

pub use date_analysis::*;
pub use gift::*;
pub use tool_call::*;
