//! Structured rate-limit window
//!
//! Windows are written in configuration as human-readable increments such as
//! `"1 minute"`, `"-5 minutes"`, `"30s"` or `"1 hour 30 minutes"` and parsed
//! once, when policies are loaded.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a window
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowParseError {
    #[error("window cannot be empty")]
    Empty,

    #[error("unexpected input '{0}'")]
    InvalidSyntax(String),

    #[error("amount '{0}' is not a valid integer")]
    InvalidAmount(String),

    #[error("amount {0} is missing a unit")]
    MissingUnit(String),

    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),

    #[error("window is too large")]
    TooLarge,

    #[error("window must be greater than zero")]
    NonPositive,
}

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Longest accepted window
pub const MAX_WINDOW_SECONDS: i64 = 366 * SECONDS_PER_DAY;

/// A strictly positive sliding-window length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LimitWindow(Duration);

impl LimitWindow {
    /// Build a window from a duration
    ///
    /// Zero and negative lengths are rejected, as is anything longer than
    /// [`MAX_WINDOW_SECONDS`].
    pub fn new(duration: Duration) -> Result<Self, WindowParseError> {
        if duration <= Duration::zero() {
            return Err(WindowParseError::NonPositive);
        }
        if duration > Duration::seconds(MAX_WINDOW_SECONDS) {
            return Err(WindowParseError::TooLarge);
        }

        Ok(Self(duration))
    }

    pub fn seconds(seconds: i64) -> Result<Self, WindowParseError> {
        Duration::try_seconds(seconds)
            .ok_or(WindowParseError::TooLarge)
            .and_then(Self::new)
    }

    pub fn minutes(minutes: i64) -> Result<Self, WindowParseError> {
        minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .ok_or(WindowParseError::TooLarge)
            .and_then(Self::seconds)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Start of the window ending at `now`
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.0
    }

    /// Parse a human-readable increment
    ///
    /// A leading sign is ignored, so `"-5 minutes"` and `"5 minutes"` are the
    /// same window. Components may be chained: `"1 hour 30 minutes"`.
    pub fn parse(input: &str) -> Result<Self, WindowParseError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('+'))
            .unwrap_or(trimmed)
            .trim_start();

        if body.is_empty() {
            return Err(WindowParseError::Empty);
        }

        let mut total_seconds: i64 = 0;
        let mut rest = body;

        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (digits, after_digits) = rest.split_at(digits_end);
            let after_digits = after_digits.trim_start();

            let unit_end = after_digits
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after_digits.len());
            let (unit, remaining) = after_digits.split_at(unit_end);

            if digits.is_empty() && unit.is_empty() {
                return Err(WindowParseError::InvalidSyntax(rest.to_string()));
            }

            if unit.is_empty() {
                if !after_digits.is_empty() {
                    return Err(WindowParseError::InvalidSyntax(after_digits.to_string()));
                }
                return Err(WindowParseError::MissingUnit(digits.to_string()));
            }

            // A bare unit ("minute") means one of it
            let amount: i64 = if digits.is_empty() {
                1
            } else {
                digits
                    .parse()
                    .map_err(|_| WindowParseError::InvalidAmount(digits.to_string()))?
            };

            let per_unit = unit_seconds(unit)
                .ok_or_else(|| WindowParseError::UnknownUnit(unit.to_string()))?;

            total_seconds = amount
                .checked_mul(per_unit)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or(WindowParseError::TooLarge)?;

            rest = remaining.trim_start();
            if let Some(stripped) = rest.strip_prefix(',') {
                rest = stripped.trim_start();
            }
        }

        Self::seconds(total_seconds)
    }
}

fn unit_seconds(unit: &str) -> Option<i64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(SECONDS_PER_MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(SECONDS_PER_HOUR),
        "d" | "day" | "days" => Some(SECONDS_PER_DAY),
        "w" | "week" | "weeks" => Some(SECONDS_PER_WEEK),
        _ => None,
    }
}

impl FromStr for LimitWindow {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LimitWindow {
    type Error = WindowParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LimitWindow> for String {
    fn from(window: LimitWindow) -> Self {
        window.to_string()
    }
}

impl std::fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.0.num_seconds();

        let (amount, unit) = if seconds % SECONDS_PER_WEEK == 0 {
            (seconds / SECONDS_PER_WEEK, "week")
        } else if seconds % SECONDS_PER_DAY == 0 {
            (seconds / SECONDS_PER_DAY, "day")
        } else if seconds % SECONDS_PER_HOUR == 0 {
            (seconds / SECONDS_PER_HOUR, "hour")
        } else if seconds % SECONDS_PER_MINUTE == 0 {
            (seconds / SECONDS_PER_MINUTE, "minute")
        } else {
            (seconds, "second")
        };

        if amount == 1 {
            write!(f, "1 {}", unit)
        } else {
            write!(f, "{} {}s", amount, unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_forms() {
        assert_eq!(LimitWindow::parse("1 minute").unwrap().duration(), Duration::seconds(60));
        assert_eq!(LimitWindow::parse("5 minutes").unwrap().duration(), Duration::seconds(300));
        assert_eq!(LimitWindow::parse("30s").unwrap().duration(), Duration::seconds(30));
        assert_eq!(LimitWindow::parse("2 hours").unwrap().duration(), Duration::hours(2));
        assert_eq!(LimitWindow::parse("1 day").unwrap().duration(), Duration::days(1));
        assert_eq!(LimitWindow::parse("minute").unwrap().duration(), Duration::seconds(60));
    }

    #[test]
    fn test_parse_ignores_leading_sign() {
        assert_eq!(
            LimitWindow::parse("-5 minutes").unwrap(),
            LimitWindow::parse("5 minutes").unwrap()
        );
        assert_eq!(
            LimitWindow::parse("+1 hour").unwrap(),
            LimitWindow::parse("1 hour").unwrap()
        );
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(
            LimitWindow::parse("1 hour 30 minutes").unwrap().duration(),
            Duration::minutes(90)
        );
        assert_eq!(
            LimitWindow::parse("1h, 15m").unwrap().duration(),
            Duration::minutes(75)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(LimitWindow::parse(""), Err(WindowParseError::Empty));
        assert_eq!(LimitWindow::parse("  - "), Err(WindowParseError::Empty));
        assert_eq!(
            LimitWindow::parse("5"),
            Err(WindowParseError::MissingUnit("5".to_string()))
        );
        assert_eq!(
            LimitWindow::parse("5 fortnights"),
            Err(WindowParseError::UnknownUnit("fortnights".to_string()))
        );
        assert_eq!(
            LimitWindow::parse("1.5 minutes"),
            Err(WindowParseError::InvalidSyntax(".5 minutes".to_string()))
        );
        assert_eq!(LimitWindow::parse("0 minutes"), Err(WindowParseError::NonPositive));
        assert_eq!(
            LimitWindow::parse("99999999999999999999 weeks"),
            Err(WindowParseError::InvalidAmount("99999999999999999999".to_string()))
        );
    }

    #[test]
    fn test_windows_longer_than_a_year_are_rejected() {
        assert_eq!(LimitWindow::parse("52 weeks").unwrap().duration(), Duration::weeks(52));
        assert!(LimitWindow::parse("366 days").is_ok());
        assert_eq!(LimitWindow::parse("367 days"), Err(WindowParseError::TooLarge));
        assert_eq!(LimitWindow::parse("20000000 weeks"), Err(WindowParseError::TooLarge));
        assert_eq!(
            LimitWindow::new(Duration::seconds(MAX_WINDOW_SECONDS + 1)),
            Err(WindowParseError::TooLarge)
        );
    }

    #[test]
    fn test_start_from() {
        let now = Utc::now();
        let window = LimitWindow::minutes(1).unwrap();

        assert_eq!(window.start_from(now), now - Duration::seconds(60));
    }

    #[test]
    fn test_display_uses_largest_exact_unit() {
        assert_eq!(LimitWindow::seconds(60).unwrap().to_string(), "1 minute");
        assert_eq!(LimitWindow::seconds(90).unwrap().to_string(), "90 seconds");
        assert_eq!(LimitWindow::seconds(7200).unwrap().to_string(), "2 hours");
        assert_eq!(LimitWindow::parse("14 days").unwrap().to_string(), "2 weeks");
    }

    #[test]
    fn test_serde_round_trip_through_string() {
        let window: LimitWindow = serde_json::from_str("\"5 minutes\"").unwrap();
        assert_eq!(serde_json::to_string(&window).unwrap(), "\"5 minutes\"");

        let invalid: Result<LimitWindow, _> = serde_json::from_str("\"soon\"");
        assert!(invalid.is_err());
    }
}
