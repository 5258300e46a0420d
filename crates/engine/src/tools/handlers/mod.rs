mod analyze_gift_date;

use super::registry::ToolRegistry;

/// Name the date tool is declared and dispatched under.
pub const ANALYZE_GIFT_DATE: &str = "analyzeGiftDate";

/// Register all gift-advisor tool handlers with the registry.
pub fn register_gift_tools(registry: &mut ToolRegistry) {
    registry.register(ANALYZE_GIFT_DATE, analyze_gift_date::handler());
}
