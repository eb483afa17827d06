use std::fmt;

use serde::Serialize;

/// Why a page could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Cancelled,
    Network,
    /// The headless browser could not be launched or driven.
    Browser,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Browser => write!(f, "browser error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RenderError {
    pub kind: FailureKind,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "cycle cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

/// What happened to one route in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Saved { route_code: String, sailings: usize },
    Failed { route_code: String, reason: String },
    Cancelled { route_code: String },
}

impl RouteOutcome {
    pub fn route_code(&self) -> &str {
        match self {
            RouteOutcome::Saved { route_code, .. }
            | RouteOutcome::Failed { route_code, .. }
            | RouteOutcome::Cancelled { route_code } => route_code,
        }
    }
}

/// Summary of one scrape cycle, logged when the cycle ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub date: String,
    pub directory_terminals: usize,
    pub directory_departures: usize,
    pub attempted: usize,
    pub saved: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub sailings: usize,
}

impl CycleReport {
    pub fn record(&mut self, outcome: &RouteOutcome) {
        self.attempted += 1;
        match outcome {
            RouteOutcome::Saved { sailings, .. } => {
                self.saved += 1;
                self.sailings += sailings;
            }
            RouteOutcome::Failed { .. } => self.failed += 1,
            RouteOutcome::Cancelled { .. } => self.cancelled += 1,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: scraped {}/{} routes ({} sailings, {} failed, {} cancelled); directory {} terminals / {} departures",
            self.date,
            self.saved,
            self.attempted,
            self.sailings,
            self.failed,
            self.cancelled,
            self.directory_terminals,
            self.directory_departures
        )
    }
}
