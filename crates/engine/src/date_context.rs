//! Seasonal and timing context for a gift date.
//!
//! `analyze_gift_date` is a pure function of the date string and "today".
//! It never fails: an unparseable date yields an `unknown` analysis.

use chrono::{Datelike, NaiveDate, Weekday};

use giftwise_common::types::{DateAnalysis, Season};

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the server's local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// How much lead time remains before the gift date.
///
/// Buckets are contiguous over the integer line: negative, 0-3, 4-7, 8-30,
/// and everything above 30.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingBucket {
    Past,
    Urgent,
    Soon,
    Moderate,
    Ample,
}

impl TimingBucket {
    pub fn from_days(days_until: i64) -> Self {
        match days_until {
            i64::MIN..=-1 => Self::Past,
            0..=3 => Self::Urgent,
            4..=7 => Self::Soon,
            8..=30 => Self::Moderate,
            _ => Self::Ample,
        }
    }

    pub fn context(&self) -> &'static str {
        match self {
            Self::Past => {
                "This date has already passed, so consider a belated gift or an experience to enjoy together"
            }
            Self::Urgent => {
                "Urgent: the date is only a few days away, so favor gifts available locally, digitally, or with express shipping"
            }
            Self::Soon => {
                "Soon: about a week away, so standard shipping still works but custom or handmade items may not arrive"
            }
            Self::Moderate => {
                "Moderate time: a few weeks remain, enough for ordering online and some personalization"
            }
            Self::Ample => {
                "Ample time: more than a month away, so custom, handmade, or pre-order gifts are all possible"
            }
        }
    }
}

const UNKNOWN_WEATHER: &str = "Unknown weather patterns";
const UNKNOWN_TIMING: &str = "Unable to determine timing from the provided date";

fn weather_patterns(season: Season) -> &'static str {
    match season {
        Season::Spring => {
            "Mild temperatures with occasional rain; flowers blooming and outdoor activities picking up"
        }
        Season::Summer => {
            "Hot and sunny weather; ideal for outdoor activities, travel, and water sports"
        }
        Season::Fall => {
            "Cool, crisp weather with changing leaves; cozy layers and indoor hobbies come back"
        }
        Season::Winter => {
            "Cold weather with possible snow; warm clothing and indoor activities are popular"
        }
        Season::Unknown => UNKNOWN_WEATHER,
    }
}

/// Parse a YYYY-MM-DD date and derive its seasonal and timing context
/// relative to `today`.
pub fn analyze_gift_date(gift_date: &str, today: NaiveDate) -> DateAnalysis {
    let date = match NaiveDate::parse_from_str(gift_date.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            tracing::debug!(gift_date, error = %e, "Unparseable gift date");
            return unknown(gift_date);
        }
    };

    let month = date.month();
    let season = Season::from_month(month);
    let days_until = (date - today).num_days();
    let weekday = date.weekday();

    DateAnalysis {
        gift_date: gift_date.to_string(),
        season,
        month: Some(month),
        days_until: Some(days_until),
        weather_patterns: weather_patterns(season).to_string(),
        timing_context: TimingBucket::from_days(days_until).context().to_string(),
        is_holiday_season: matches!(month, 11 | 12),
        is_summer_season: matches!(month, 6..=8),
        day_of_week: Some(weekday_name(weekday).to_string()),
        is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
    }
}

fn unknown(gift_date: &str) -> DateAnalysis {
    DateAnalysis {
        gift_date: gift_date.to_string(),
        season: Season::Unknown,
        month: None,
        days_until: None,
        weather_patterns: UNKNOWN_WEATHER.to_string(),
        timing_context: UNKNOWN_TIMING.to_string(),
        is_holiday_season: false,
        is_summer_season: false,
        day_of_week: None,
        is_weekend: false,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
