//! Sailing duration text and dwell-time arithmetic.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{EventKind, SailingEvent};
use crate::reference::ReferenceData;

fn hours_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s*h").expect("valid hours regex"))
}

fn minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s*m").expect("valid minutes regex"))
}

/// Converts `"2h 15m"`, `"1h"`, `"45m"` or `"01:40"` to minutes.
///
/// Unparseable text yields 0; this never fails.
pub fn parse_duration_to_minutes(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let capture = |pattern: &Regex| {
        pattern
            .captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
    };
    let hours = capture(hours_pattern()).unwrap_or(0);
    let minutes = capture(minutes_pattern()).unwrap_or(0);
    let total = hours.saturating_mul(60).saturating_add(minutes);
    if total > 0 {
        return total;
    }

    match text.split_once(':') {
        Some((h, m)) if !m.contains(':') => match (h.trim().parse::<u32>(), m.trim().parse::<u32>()) {
            (Ok(h), Ok(m)) => h.saturating_mul(60).saturating_add(m),
            _ => 0,
        },
        _ => 0,
    }
}

/// Intermediate port calls that count towards dwell; thru-fares do not.
pub fn stop_count(events: &[SailingEvent]) -> u32 {
    events
        .iter()
        .filter(|event| matches!(event.kind, EventKind::Stop | EventKind::Transfer))
        .count() as u32
}

/// Sums static leg durations along `origin → events… → destination`.
///
/// Pairs without reference data contribute nothing.
pub fn estimate_travel_minutes(
    reference: &ReferenceData,
    origin: &str,
    destination: &str,
    events: &[SailingEvent],
) -> u32 {
    let mut chain: Vec<String> = Vec::with_capacity(events.len() + 2);
    chain.push(origin.to_string());
    for event in events {
        chain.push(
            reference
                .terminal_code_by_name(&event.terminal_name)
                .unwrap_or_default()
                .to_string(),
        );
    }
    chain.push(destination.to_string());

    chain
        .windows(2)
        .filter_map(|pair| reference.leg_info(&pair[0], &pair[1]))
        .map(|info| info.avg_duration_min)
        .sum()
}

/// Provisional dwell per stop used for vessel lookups before legs exist.
pub fn provisional_dwell_per_stop(sailing_minutes: u32, estimated_travel: u32, stops: u32) -> u32 {
    if stops == 0 || sailing_minutes <= estimated_travel {
        return 0;
    }
    (sailing_minutes - estimated_travel) / stops
}

/// Aggregates recomputed from the legs that were actually built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellSummary {
    pub total_travel_min: i64,
    pub total_dwell_min: i64,
    pub stop_count: u32,
    pub avg_dwell_per_stop_min: Option<i64>,
}

impl DwellSummary {
    pub fn compute(sailing_minutes: u32, leg_durations: &[Option<u32>], stop_count: u32) -> Self {
        let total_travel_min: i64 = leg_durations.iter().flatten().map(|m| i64::from(*m)).sum();
        let total_dwell_min = i64::from(sailing_minutes) - total_travel_min;
        let avg_dwell_per_stop_min = (stop_count > 0 && total_dwell_min > 0)
            .then(|| total_dwell_min / i64::from(stop_count));
        Self {
            total_travel_min,
            total_dwell_min,
            stop_count,
            avg_dwell_per_stop_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_formats() {
        assert_eq!(parse_duration_to_minutes("2h 15m"), 135);
        assert_eq!(parse_duration_to_minutes("1h"), 60);
        assert_eq!(parse_duration_to_minutes("45m"), 45);
        assert_eq!(parse_duration_to_minutes("01:40"), 100);
        assert_eq!(parse_duration_to_minutes("00:50"), 50);
        assert_eq!(parse_duration_to_minutes(""), 0);
        assert_eq!(parse_duration_to_minutes("varies"), 0);
        assert_eq!(parse_duration_to_minutes("1:2:3"), 0);
    }

    #[test]
    fn provisional_dwell_is_never_negative() {
        assert_eq!(provisional_dwell_per_stop(100, 120, 2), 0);
        assert_eq!(provisional_dwell_per_stop(100, 80, 0), 0);
        assert_eq!(provisional_dwell_per_stop(100, 80, 2), 10);
    }

    #[test]
    fn summary_omits_average_without_positive_dwell() {
        let summary = DwellSummary::compute(90, &[Some(55), None, Some(40)], 2);
        assert_eq!(summary.total_travel_min, 95);
        assert_eq!(summary.total_dwell_min, -5);
        assert_eq!(summary.avg_dwell_per_stop_min, None);

        let summary = DwellSummary::compute(135, &[Some(55), Some(40)], 2);
        assert_eq!(summary.total_dwell_min, 40);
        assert_eq!(summary.avg_dwell_per_stop_min, Some(20));
    }
}
