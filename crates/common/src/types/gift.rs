use serde::{Deserialize, Serialize};

/// A validated gift request. Built from the inbound body once the
/// required fields are known to be present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRequest {
    pub name: String,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<String>,
    pub occasion: String,
    /// Calendar date of the occasion, expected as YYYY-MM-DD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift_date: Option<String>,
}

/// One ranked suggestion produced by the model.
///
/// Field names match the JSON shape the model is instructed to emit.
/// `fit_score` is advisory (1-100); it is not range-checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftRecommendation {
    pub name: String,
    pub description: String,
    pub fit_score: i64,
    pub reasoning: String,
}
