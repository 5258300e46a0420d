use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::GiftwiseError;
use crate::types::{GiftRecommendation, GiftRequest, ToolCallRequest, ToolResult};

/// Message returned when a required field is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "Name, age, and occasion are required";

/// Message returned when the model's final answer is not valid gift JSON.
pub const UNPARSEABLE_RESPONSE_MESSAGE: &str = "Could not parse AI response";

/// POST /generate-gifts request body, as sent by the form client.
///
/// Every field is optional at the wire level so that missing fields can be
/// reported with a single validation message instead of a decode error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateGiftsRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Accepts a JSON number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_age")]
    pub age: Option<u32>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub gift_date: Option<String>,
}

impl GenerateGiftsRequest {
    /// Check required fields and build the domain request.
    ///
    /// Blank strings count as missing, as does an age of zero.
    pub fn validate(self) -> Result<GiftRequest, GiftwiseError> {
        let name = non_blank(self.name);
        let occasion = non_blank(self.occasion);
        let age = self.age.filter(|a| *a > 0);

        match (name, age, occasion) {
            (Some(name), Some(age), Some(occasion)) => Ok(GiftRequest {
                name,
                age,
                hobbies: non_blank(self.hobbies),
                occasion,
                gift_date: non_blank(self.gift_date),
            }),
            _ => Err(GiftwiseError::Validation(MISSING_FIELDS_MESSAGE.into())),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// POST /generate-gifts response body.
///
/// Serialized untagged: each variant carries its own `success` flag.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateGiftsResponse {
    Success(GiftSuccess),
    Failure(GiftFailure),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSuccess {
    pub success: bool,
    /// The validated request, not the body as received: strings are
    /// trimmed, `age` is a number even when sent as a numeric string, and
    /// blank `hobbies` or `giftDate` are omitted.
    pub input: GiftRequest,
    pub gifts: Vec<GiftRecommendation>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_results: Vec<ToolResult>,
}

/// A semantically failed but well-formed response.
#[derive(Clone, Debug, Serialize)]
pub struct GiftFailure {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl GenerateGiftsResponse {
    pub fn success(
        input: GiftRequest,
        gifts: Vec<GiftRecommendation>,
        tool_calls: Vec<ToolCallRequest>,
        tool_results: Vec<ToolResult>,
    ) -> Self {
        Self::Success(GiftSuccess {
            success: true,
            input,
            gifts,
            tool_calls,
            tool_results,
        })
    }

    pub fn unparseable(raw_response: String) -> Self {
        Self::Failure(GiftFailure {
            success: false,
            error: UNPARSEABLE_RESPONSE_MESSAGE.into(),
            raw_response: Some(raw_response),
        })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(GiftFailure {
            success: false,
            error: error.into(),
            raw_response: None,
        })
    }
}

/// Error body for 4xx/5xx responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
