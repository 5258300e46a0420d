use serde::Deserialize;

use giftwise_common::types::GiftRecommendation;

/// The model's final answer did not decode as `{ "gifts": [...] }`.
///
/// Carries the raw text so it can be surfaced for debugging.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Malformed model output: {detail}")]
pub struct MalformedModelOutput {
    pub raw: String,
    pub detail: String,
}

#[derive(Deserialize)]
struct GiftEnvelope {
    gifts: Vec<GiftRecommendation>,
}

/// Strictly decode the model's final text into gift recommendations.
///
/// Only the shape is checked. Gift count and `fit_score` range are left to
/// the prompt.
pub fn parse_gift_response(raw: &str) -> Result<Vec<GiftRecommendation>, MalformedModelOutput> {
    serde_json::from_str::<GiftEnvelope>(raw)
        .map(|envelope| envelope.gifts)
        .map_err(|e| MalformedModelOutput {
            raw: raw.to_string(),
            detail: e.to_string(),
        })
}
