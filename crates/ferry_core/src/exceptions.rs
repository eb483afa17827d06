//! Calendar exceptions printed next to sailings, e.g.
//! `"Only on Sep 14, 28 & Oct 12"` or `"Except on Oct 13"`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::clock::ServiceDay;

const MONTH_ALTERNATION: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// `Month Day` followed by any trailing run of non-letters.
fn month_segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b({MONTH_ALTERNATION})\s+(\d{{1,2}})([^a-z]*)"))
            .expect("valid month segment regex")
    })
}

fn bare_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[,&\s]+(\d{1,2})\b").expect("valid bare day regex"))
}

fn month_number(token: &str) -> Option<u32> {
    let prefix: String = token.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Dates mentioned in a note, keyed `"MM-DD"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateExceptionSet {
    dates: BTreeSet<MonthDay>,
}

impl DateExceptionSet {
    /// Collects every `Month Day` mention plus the bare day numbers that trail
    /// it up to the next month name.
    pub fn parse(note: &str) -> Self {
        let lower = note.to_lowercase();
        let mut dates = BTreeSet::new();

        for caps in month_segment_pattern().captures_iter(&lower) {
            let Some(month) = month_number(&caps[1]) else {
                continue;
            };
            if let Ok(day) = caps[2].parse::<u32>() {
                dates.insert(MonthDay { month, day });
            }
            for day_caps in bare_day_pattern().captures_iter(&caps[3]) {
                if let Ok(day) = day_caps[1].parse::<u32>() {
                    dates.insert(MonthDay { month, day });
                }
            }
        }

        Self { dates }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.dates.iter().any(|date| date.to_string() == key)
    }

    pub fn contains(&self, date: MonthDay) -> bool {
        self.dates.contains(&date)
    }

    pub fn keys(&self) -> Vec<String> {
        self.dates.iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Decides whether a sailing carrying `notes` runs on `day`.
///
/// `"only on"` admits listed dates only; `"except on"` removes listed dates.
/// Both may apply. A note with neither phrase never gates the sailing.
pub fn runs_on(notes: &str, day: &ServiceDay) -> bool {
    let lower = notes.to_lowercase();
    let only_on = lower.contains("only on");
    let except_on = lower.contains("except on");
    if !only_on && !except_on {
        return true;
    }

    let dates = DateExceptionSet::parse(&lower);
    let today = day.month_day_key();
    if only_on && !dates.contains_key(&today) {
        return false;
    }
    if except_on && dates.contains_key(&today) {
        return false;
    }
    true
}
