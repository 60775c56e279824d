use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Canonical partition format: `20250121`.
const CANONICAL_FORMAT: &str = "%Y%m%d";
/// Dashed form used by the reference-date record: `2025-01-21`.
const DASHED_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DayError {
    #[error("day '{0}' is not in YYYYMMDD form")]
    Format(String),

    #[error("day '{0}' is not a valid calendar date")]
    Calendar(String),
}

/// A calendar day, rendered as `YYYYMMDD` for partition keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Strict parse: exactly eight ASCII digits forming a real date.
    pub fn parse_canonical(s: &str) -> Result<Self, DayError> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DayError::Format(s.to_string()));
        }
        NaiveDate::parse_from_str(s, CANONICAL_FORMAT)
            .map(Self)
            .map_err(|_| DayError::Calendar(s.to_string()))
    }

    /// Accepts `YYYYMMDD` or `YYYY-MM-DD` and normalizes to a [`Day`].
    pub fn parse_lenient(s: &str) -> Result<Self, DayError> {
        let trimmed = s.trim();
        if trimmed.contains('-') {
            // Shape check first so "2025-1-5" is a format error, not a calendar one.
            let shaped = trimmed.len() == 10
                && trimmed.bytes().enumerate().all(|(i, b)| match i {
                    4 | 7 => b == b'-',
                    _ => b.is_ascii_digit(),
                });
            if !shaped {
                return Err(DayError::Format(s.to_string()));
            }
            return NaiveDate::parse_from_str(trimmed, DASHED_FORMAT)
                .map(Self)
                .map_err(|_| DayError::Calendar(s.to_string()));
        }
        Self::parse_canonical(trimmed)
    }

    pub fn previous(self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The `YYYYMMDD` form used in `date=` partition segments.
    pub fn canonical(self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for Day {
    type Err = DayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s)
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Day::parse_lenient(&raw).map_err(serde::de::Error::custom)
    }
}
