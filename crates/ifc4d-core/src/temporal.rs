//! Date and duration values as they appear in building-data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Elapsed (calendar) duration
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    /// Number of seconds
    pub seconds: i64,
}

impl Duration {
    pub const fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn seconds(s: i64) -> Self {
        Self { seconds: s }
    }

    pub const fn hours(h: i64) -> Self {
        Self { seconds: h * 3600 }
    }

    pub const fn days(d: i64) -> Self {
        Self {
            seconds: d * SECONDS_PER_DAY,
        }
    }

    /// Whole days, rounded towards negative infinity
    pub fn whole_days(&self) -> i64 {
        self.seconds.div_euclid(SECONDS_PER_DAY)
    }

    /// Parse an ISO 8601 duration such as `P5D`, `PT40H` or `P1Y2M3DT4H`.
    ///
    /// Years count as 365 days and months as 30 days. Returns `None` for
    /// anything that is not a well-formed duration.
    pub fn parse_iso8601(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let body = text.strip_prefix('P')?;

        let mut seconds = 0.0_f64;
        let mut in_time = false;
        let mut number = String::new();
        let mut has_component = false;

        for c in body.chars() {
            match c {
                'T' => {
                    if in_time || !number.is_empty() {
                        return None;
                    }
                    in_time = true;
                }
                '0'..='9' | '.' => number.push(c),
                ',' => number.push('.'),
                unit => {
                    let value: f64 = number.parse().ok()?;
                    number.clear();
                    let factor = match (in_time, unit) {
                        (false, 'Y') => 365 * SECONDS_PER_DAY,
                        (false, 'M') => 30 * SECONDS_PER_DAY,
                        (false, 'W') => 7 * SECONDS_PER_DAY,
                        (false, 'D') => SECONDS_PER_DAY,
                        (true, 'H') => 3600,
                        (true, 'M') => 60,
                        (true, 'S') => 1,
                        _ => return None,
                    };
                    seconds += value * factor as f64;
                    has_component = true;
                }
            }
        }

        if !number.is_empty() || !has_component {
            return None;
        }

        let seconds = seconds.round() as i64;
        Some(Self::seconds(if negative { -seconds } else { seconds }))
    }
}

/// Parse the date part of an ISO 8601 date or date-time.
///
/// Accepts `YYYY-MM-DD` and `YYYY-MM-DDThh:mm:ss` with optional fraction and
/// offset; the time of day is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.split_once('T').map_or(text, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
