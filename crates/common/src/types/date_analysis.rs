use serde::{Deserialize, Serialize};

/// Meteorological season for a calendar month (northern hemisphere).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    /// Date could not be parsed.
    Unknown,
}

impl Season {
    /// Fixed calendar partition: Mar-May spring, Jun-Aug summer,
    /// Sep-Nov fall, Dec-Feb winter. Out-of-range months are `Unknown`.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            12 | 1 | 2 => Self::Winter,
            _ => Self::Unknown,
        }
    }
}

/// Seasonal and timing context for a gift date.
///
/// Recomputed on every tool invocation; never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAnalysis {
    pub gift_date: String,
    pub season: Season,
    /// 1-12, or `None` when the date could not be parsed.
    pub month: Option<u32>,
    /// Whole days from today to the gift date. Negative when the date has
    /// passed, `None` only when the date could not be parsed.
    pub days_until: Option<i64>,
    pub weather_patterns: String,
    pub timing_context: String,
    pub is_holiday_season: bool,
    pub is_summer_season: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub is_weekend: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_partition_is_total_over_months() {
        let expected = [
            Season::Winter,
            Season::Winter,
            Season::Spring,
            Season::Spring,
            Season::Spring,
            Season::Summer,
            Season::Summer,
            Season::Summer,
            Season::Fall,
            Season::Fall,
            Season::Fall,
            Season::Winter,
        ];
        for (i, season) in expected.iter().enumerate() {
            assert_eq!(Season::from_month(i as u32 + 1), *season, "month {}", i + 1);
        }
        assert_eq!(Season::from_month(0), Season::Unknown);
        assert_eq!(Season::from_month(13), Season::Unknown);
    }

    #[test]
    fn test_season_serializes_lowercase() {
        let json = serde_json::to_value(Season::Fall).unwrap();
        assert_eq!(json, "fall");
        let json = serde_json::to_value(Season::Unknown).unwrap();
        assert_eq!(json, "unknown");
    }
}
