//! Per-terminal directory of scheduled departures and the nearest-time
//! vessel heuristic built on it.
//!
//! Assignments are approximate: the directory is a snapshot of the
//! departures pages and the match only picks the closest scheduled time.

use std::collections::BTreeMap;

use ferry_logging::{ferry_debug, ferry_trace};

use crate::clock_time::{normalize_time_key, ClockTime};
use crate::model::UNKNOWN_VESSEL;

/// Search window for nearest-time matching, in minutes either side.
pub const VESSEL_MATCH_WINDOW_MIN: u32 = 60;

/// Scheduled time (`"7:10 am"`) to vessel name for one terminal.
pub type TerminalDepartures = BTreeMap<String, String>;

/// Terminal code to its departures. Built fresh every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VesselDirectory {
    terminals: BTreeMap<String, TerminalDepartures>,
}

impl VesselDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a terminal, keeping it present even with no departures.
    pub fn insert_terminal(&mut self, code: impl Into<String>, departures: TerminalDepartures) {
        self.terminals.insert(code.into(), departures);
    }

    /// Adds one departure, normalizing the time key.
    pub fn insert(&mut self, code: &str, scheduled_time: &str, vessel: impl Into<String>) {
        self.terminals
            .entry(code.to_string())
            .or_default()
            .insert(normalize_time_key(scheduled_time), vessel.into());
    }

    pub fn departures(&self, code: &str) -> Option<&TerminalDepartures> {
        self.terminals.get(code)
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn departure_count(&self) -> usize {
        self.terminals.values().map(BTreeMap::len).sum()
    }

    /// Vessel for a departure from `code` near `target_time`. A terminal that
    /// is absent from the directory reads as one with no departures.
    pub fn vessel_near(&self, code: &str, target_time: &str) -> String {
        match self.departures(code) {
            Some(departures) => {
                find_vessel_by_time_window(departures, target_time, VESSEL_MATCH_WINDOW_MIN)
            }
            None => UNKNOWN_VESSEL.to_string(),
        }
    }
}

/// Returns the vessel whose scheduled time is closest to `target_time`
/// within `window_minutes`, or [`UNKNOWN_VESSEL`].
///
/// Equally close candidates resolve to the lexicographically smaller time
/// key, so results do not depend on map iteration order.
pub fn find_vessel_by_time_window(
    departures: &TerminalDepartures,
    target_time: &str,
    window_minutes: u32,
) -> String {
    let target = match ClockTime::parse(target_time) {
        Ok(target) => target,
        Err(err) => {
            ferry_debug!("Cannot match vessel: {}", err);
            return UNKNOWN_VESSEL.to_string();
        }
    };

    let candidates: Vec<(u32, &str, &str)> = departures
        .iter()
        .filter_map(|(time, vessel)| {
            let scheduled = ClockTime::parse(time).ok()?;
            let diff = scheduled.abs_diff(&target);
            (diff <= window_minutes).then_some((diff, time.as_str(), vessel.as_str()))
        })
        .collect();

    if candidates.len() > 1 {
        ferry_trace!(
            "{} departures within {} minutes of {}",
            candidates.len(),
            window_minutes,
            target
        );
    }

    match candidates.into_iter().min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(b.1))) {
        Some((_, _, vessel)) => vessel.to_string(),
        None => {
            ferry_debug!(
                "No vessel found within {} minutes of {}",
                window_minutes,
                target
            );
            UNKNOWN_VESSEL.to_string()
        }
    }
}
