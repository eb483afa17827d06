//! Twelve-hour schedule times such as `"7:05 am"`.
//!
//! Schedule and departures pages print times in several casings and
//! spacings (`"7:05 AM"`, `"07:05 am"`, `"7:05pm"`), sometimes followed by a
//! `"(Tomorrow)"` marker. [`ClockTime`] accepts all of them and renders the
//! canonical lowercase form used as the vessel directory key.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock time {input:?}")]
pub struct ClockTimeError {
    input: String,
}

/// A time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime {
    minutes: u32,
}

fn twelve_hour_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])m$").expect("valid clock time regex")
    })
}

fn time_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b\d{1,2}:\d{2}\s*[ap]m\b").expect("valid time token regex")
    })
}

impl ClockTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// Parses `H:MM am|pm` in any casing, with or without the space.
    pub fn parse(input: &str) -> Result<Self, ClockTimeError> {
        let err = || ClockTimeError {
            input: input.to_string(),
        };
        let cleaned = input.replace("(Tomorrow)", "");
        let caps = twelve_hour_pattern()
            .captures(cleaned.trim())
            .ok_or_else(err)?;

        let hour: u32 = caps[1].parse().map_err(|_| err())?;
        let minute: u32 = caps[2].parse().map_err(|_| err())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(err());
        }
        let pm = caps[3].eq_ignore_ascii_case("p");
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        Self::from_hm(hour24, minute).ok_or_else(err)
    }

    pub fn hour(&self) -> u32 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes % 60
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.minutes
    }

    /// Adds minutes, wrapping past midnight.
    pub fn add_minutes(self, minutes: u32) -> Self {
        Self {
            minutes: (self.minutes + minutes) % MINUTES_PER_DAY,
        }
    }

    /// Absolute difference in minutes within the same day.
    pub fn abs_diff(&self, other: &ClockTime) -> u32 {
        self.minutes.abs_diff(other.minutes)
    }

    /// Zero-padded 24-hour rendering without a colon, e.g. `"1515"`.
    pub fn to_hhmm(&self) -> String {
        format!("{:02}{:02}", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    /// Canonical lowercase twelve-hour form, e.g. `"3:15 pm"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, suffix) = match self.hour() {
            0 => (12, "am"),
            h @ 1..=11 => (h, "am"),
            12 => (12, "pm"),
            h => (h - 12, "pm"),
        };
        write!(f, "{}:{:02} {}", hour, self.minute(), suffix)
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns the first time-like token (`H:MM am|pm`) in `text`.
pub fn first_time_token(text: &str) -> Option<&str> {
    time_token_pattern().find(text).map(|m| m.as_str())
}

/// Lowercases a departures-page time for use as a directory key.
pub fn normalize_time_key(text: &str) -> String {
    ClockTime::parse(text)
        .map(|t| t.to_string())
        .unwrap_or_else(|_| text.trim().to_lowercase())
}
