use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::date_context::analyze_gift_date;
use crate::tools::registry::{ToolError, ToolHandler, ToolHandlerContext};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    gift_date: String,
}

pub fn handler() -> ToolHandler {
    Arc::new(|args: Map<String, Value>, ctx: Arc<ToolHandlerContext>| {
        Box::pin(async move {
            let args: Args = serde_json::from_value(Value::Object(args)).map_err(|e| {
                ToolError::InvalidArguments {
                    tool: super::ANALYZE_GIFT_DATE.to_string(),
                    detail: e.to_string(),
                }
            })?;

            let analysis = analyze_gift_date(&args.gift_date, ctx.clock.today());

            serde_json::to_value(&analysis).map_err(|e| ToolError::Execution {
                tool: super::ANALYZE_GIFT_DATE.to_string(),
                detail: e.to_string(),
            })
        })
    })
}
