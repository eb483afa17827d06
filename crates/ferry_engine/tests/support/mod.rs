#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use ferry_core::{FixedClock, ReferenceData};
use ferry_engine::{FailureKind, RenderError, Renderer, SourceUrls};
use tokio_util::sync::CancellationToken;

pub const SCHEDULE_TSA_POB: &str = include_str!("../fixtures/schedule_tsa_pob.html");
pub const DEPARTURES_TSA: &str = include_str!("../fixtures/departures_tsa.html");

/// Two routes out of Tsawwassen over the real terminal and leg tables.
pub const TEST_REFERENCE: &str = r#"(
    version: 7,
    terminals: [
        (code: "TSA", name: "Tsawwassen", service_area: "Vancouver", lat: 49.0, lon: -123.1),
        (code: "POB", name: "Otter Bay", service_area: "Pender Island", lat: 48.8, lon: -123.3),
        (code: "PSB", name: "Sturdies Bay", service_area: "Galiano Island", lat: 48.9, lon: -123.3),
        (code: "PVB", name: "Village Bay", service_area: "Mayne Island", lat: 48.8, lon: -123.3),
        (code: "PST", name: "Lyall Harbour", service_area: "Saturna Island", lat: 48.8, lon: -123.2),
    ],
    legs: [
        (from: "TSA", to: "PSB", distance_km: 22.5, avg_duration_min: 55),
        (from: "PSB", to: "POB", distance_km: 14.3, avg_duration_min: 40),
        (from: "TSA", to: "PVB", distance_km: 27.1, avg_duration_min: 70),
        (from: "PVB", to: "PST", distance_km: 13.0, avg_duration_min: 35),
        (from: "PST", to: "POB", distance_km: 12.4, avg_duration_min: 40),
        (from: "TSA", to: "POB", distance_km: 35.0, avg_duration_min: 80),
    ],
    routes: [
        (from: "TSA", to: ["POB", "PSB", "POB"]),
    ],
)"#;

pub fn init_logging() {
    ferry_logging::initialize_for_tests();
}

pub fn reference() -> Arc<ReferenceData> {
    Arc::new(ReferenceData::from_ron_str(TEST_REFERENCE).expect("test reference parses"))
}

/// 2025-09-28 is a Sunday.
pub fn sunday() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2025, 9, 28).unwrap())
}

pub fn sources() -> SourceUrls {
    SourceUrls {
        schedule_template: "http://ferry.test/seasonal/{from}-{to}".into(),
        departures_template: "http://ferry.test/departures?terminalCode={terminal}".into(),
    }
}

/// Serves canned pages by URL and records what was requested.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, Result<String, RenderError>>,
    requests: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub fn with_failure(mut self, url: &str, kind: FailureKind) -> Self {
        self.pages
            .insert(url.to_string(), Err(RenderError::new(kind, "canned failure")));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Departures for TSA, a good TSA-POB page and a failing TSA-PSB page.
    pub fn standard() -> Self {
        Self::new()
            .with_page("http://ferry.test/departures?terminalCode=TSA", DEPARTURES_TSA)
            .with_page("http://ferry.test/seasonal/TSA-POB", SCHEDULE_TSA_POB)
            .with_failure("http://ferry.test/seasonal/TSA-PSB", FailureKind::HttpStatus(500))
    }
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String, RenderError> {
        self.requests.lock().unwrap().push(url.to_string());
        if cancel.is_cancelled() {
            return Err(RenderError::cancelled());
        }
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(RenderError::new(FailureKind::HttpStatus(404), url)))
    }
}
