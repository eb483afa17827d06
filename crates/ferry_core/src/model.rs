//! Persisted route and sailing records.
//!
//! Field names follow the published JSON shape (`time`, `arrivalTime`,
//! `sailingDuration`, ...), so records written by one version stay readable
//! by the next.

use serde::{Deserialize, Serialize};

use crate::clock_time::ClockTime;
use crate::reference::Terminal;

/// Sentinel vessel name when no departure lies within the match window.
pub const UNKNOWN_VESSEL: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "thruFare")]
    ThruFare,
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "transfer")]
    Transfer,
}

impl EventKind {
    /// A vessel change follows this event.
    pub fn changes_vessel(&self) -> bool {
        matches!(self, EventKind::ThruFare | EventKind::Transfer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SailingEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Terminal label as scraped, e.g. `"Victoria (Swartz Bay)"`.
    pub terminal_name: String,
}

impl SailingEvent {
    pub fn new(kind: EventKind, terminal_name: impl Into<String>) -> Self {
        Self {
            kind,
            terminal_name: terminal_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// 1-based position within the sailing.
    pub sequence: u32,
    pub origin: Terminal,
    pub destination: Terminal,
    pub distance_km: Option<f64>,
    pub avg_duration_min: Option<u32>,
    pub vessel_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sailing {
    pub id: String,
    #[serde(rename = "time")]
    pub departure_time: String,
    pub arrival_time: String,
    pub sailing_duration: String,
    /// Status notes joined with `" | "`.
    #[serde(rename = "vesselStatus")]
    pub status: String,
    #[serde(default)]
    pub events: Vec<SailingEvent>,
    #[serde(default)]
    pub legs: Vec<Leg>,
    pub total_travel_min: i64,
    pub total_dwell_min: i64,
    pub stop_count: u32,
    pub avg_dwell_per_stop_min: Option<i64>,
}

/// One day's snapshot of a route. A new record replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub date: String,
    pub route_code: String,
    pub from_terminal_code: String,
    pub to_terminal_code: String,
    pub sailing_duration: String,
    pub sailings: Vec<Sailing>,
}

impl RouteRecord {
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            date: self.date.clone(),
            route_code: self.route_code.clone(),
            from_terminal_code: self.from_terminal_code.clone(),
            to_terminal_code: self.to_terminal_code.clone(),
            sailing_duration: self.sailing_duration.clone(),
        }
    }
}

/// Route metadata without sailings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub date: String,
    pub route_code: String,
    pub from_terminal_code: String,
    pub to_terminal_code: String,
    pub sailing_duration: String,
}

/// `{routeCode}-{date}-{HHMM}`; unparseable times render as `0000`.
pub fn sailing_id(route_code: &str, date: &str, departure_time: &str) -> String {
    let hhmm = ClockTime::parse(departure_time)
        .map(|t| t.to_hhmm())
        .unwrap_or_else(|_| "0000".to_string());
    format!("{route_code}-{date}-{hhmm}")
}
