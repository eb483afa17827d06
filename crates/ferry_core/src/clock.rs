//! Current service day in the operating region's timezone.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use ferry_logging::ferry_warn;

/// The calendar day a scrape cycle runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDay {
    date: NaiveDate,
}

impl ServiceDay {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Upper-case weekday name as printed in schedule headers, e.g. `"MONDAY"`.
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday() {
            Weekday::Mon => "MONDAY",
            Weekday::Tue => "TUESDAY",
            Weekday::Wed => "WEDNESDAY",
            Weekday::Thu => "THURSDAY",
            Weekday::Fri => "FRIDAY",
            Weekday::Sat => "SATURDAY",
            Weekday::Sun => "SUNDAY",
        }
    }

    /// ISO date, e.g. `"2025-09-28"`.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `"MM-DD"` key used by exception notes.
    pub fn month_day_key(&self) -> String {
        format!("{:02}-{:02}", self.date.month(), self.date.day())
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> ServiceDay;
}

/// Wall clock in a named IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    zone: Option<Tz>,
}

impl ZonedClock {
    /// Unknown zone names fall back to UTC rather than failing.
    pub fn new(zone_name: &str) -> Self {
        match zone_name.parse::<Tz>() {
            Ok(zone) => Self { zone: Some(zone) },
            Err(err) => {
                ferry_warn!("Unknown timezone {:?} ({}); falling back to UTC", zone_name, err);
                Self { zone: None }
            }
        }
    }

    pub fn utc() -> Self {
        Self { zone: None }
    }

    pub fn is_fallback(&self) -> bool {
        self.zone.is_none()
    }
}

impl Clock for ZonedClock {
    fn today(&self) -> ServiceDay {
        let now = Utc::now();
        let date = match self.zone {
            Some(zone) => now.with_timezone(&zone).date_naive(),
            None => now.date_naive(),
        };
        ServiceDay::new(date)
    }
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> ServiceDay {
        ServiceDay::new(self.0)
    }
}
