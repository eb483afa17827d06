//! Static reference data: terminals, leg distances/durations and the route
//! list. Loaded once from a versioned RON resource and immutable afterwards.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

const BUILTIN_REFERENCE: &str = include_str!("../data/reference.ron");

/// Code used for terminals that cannot be resolved from scraped text.
pub const UNKNOWN_TERMINAL_CODE: &str = "UNKNOWN";

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read reference data {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference data: {0}")]
    Parse(String),
    #[error("duplicate terminal code {0}")]
    DuplicateTerminal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    pub code: String,
    pub name: String,
    pub service_area: String,
    pub lat: f64,
    pub lon: f64,
}

impl Terminal {
    /// Placeholder for an event terminal whose scraped name matched nothing.
    pub fn unknown(raw_name: &str) -> Self {
        Self {
            code: UNKNOWN_TERMINAL_CODE.to_string(),
            name: raw_name.to_string(),
            service_area: String::new(),
            lat: 0.0,
            lon: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.code == UNKNOWN_TERMINAL_CODE
    }

    /// The `ServiceArea (Name)` form used on schedule pages.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.service_area, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegInfo {
    pub distance_km: f64,
    pub avg_duration_min: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub from: String,
    pub to: String,
}

impl RouteKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Splits a six character route code into its origin and destination.
    pub fn parse(code: &str) -> Option<Self> {
        let chars: Vec<char> = code.chars().collect();
        if chars.len() != 6 {
            return None;
        }
        Some(Self {
            from: chars[..3].iter().collect(),
            to: chars[3..].iter().collect(),
        })
    }

    pub fn code(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

#[derive(Debug, Deserialize)]
struct RawTerminal {
    code: String,
    name: String,
    service_area: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    from: String,
    to: String,
    distance_km: f64,
    avg_duration_min: u32,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    from: String,
    to: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    version: u32,
    terminals: Vec<RawTerminal>,
    legs: Vec<RawLeg>,
    routes: Vec<RawRoute>,
}

#[derive(Debug, Clone)]
pub struct ReferenceData {
    version: u32,
    terminals: HashMap<String, Terminal>,
    names: HashMap<String, String>,
    legs: HashMap<(String, String), LegInfo>,
    routes: Vec<RouteKey>,
}

impl ReferenceData {
    /// Reference data embedded in the crate.
    pub fn builtin() -> Result<Self, ReferenceError> {
        Self::from_ron_str(BUILTIN_REFERENCE)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReferenceError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ReferenceError> {
        let raw: RawReference =
            ron::from_str(text).map_err(|err| ReferenceError::Parse(err.to_string()))?;

        let mut terminals = HashMap::with_capacity(raw.terminals.len());
        let mut names = HashMap::with_capacity(raw.terminals.len());
        for raw_terminal in raw.terminals {
            let terminal = Terminal {
                code: raw_terminal.code,
                name: raw_terminal.name,
                service_area: raw_terminal.service_area,
                lat: raw_terminal.lat,
                lon: raw_terminal.lon,
            };
            names.insert(terminal.display_name(), terminal.code.clone());
            if terminals.contains_key(&terminal.code) {
                return Err(ReferenceError::DuplicateTerminal(terminal.code));
            }
            terminals.insert(terminal.code.clone(), terminal);
        }

        let legs = raw
            .legs
            .into_iter()
            .map(|leg| {
                (
                    (leg.from, leg.to),
                    LegInfo {
                        distance_km: leg.distance_km,
                        avg_duration_min: leg.avg_duration_min,
                    },
                )
            })
            .collect();

        // The published route table repeats some destinations.
        let mut seen = BTreeSet::new();
        let mut routes = Vec::new();
        for route in raw.routes {
            for to in route.to {
                let key = RouteKey::new(route.from.clone(), to);
                if seen.insert(key.clone()) {
                    routes.push(key);
                }
            }
        }

        Ok(Self {
            version: raw.version,
            terminals,
            names,
            legs,
            routes,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn terminal(&self, code: &str) -> Option<&Terminal> {
        self.terminals.get(code)
    }

    /// Resolves a scraped `ServiceArea (Name)` label to a terminal code.
    pub fn terminal_code_by_name(&self, name: &str) -> Option<&str> {
        self.names.get(name.trim()).map(String::as_str)
    }

    /// Resolves a scraped name to a terminal, falling back to a synthetic
    /// `UNKNOWN` terminal that carries the raw name.
    pub fn resolve_terminal(&self, name: &str) -> Terminal {
        self.terminal_code_by_name(name)
            .and_then(|code| self.terminal(code))
            .cloned()
            .unwrap_or_else(|| Terminal::unknown(name))
    }

    /// Absent pairs are unknown, not zero.
    pub fn leg_info(&self, from: &str, to: &str) -> Option<LegInfo> {
        self.legs.get(&(from.to_string(), to.to_string())).copied()
    }

    pub fn routes(&self) -> &[RouteKey] {
        &self.routes
    }

    /// Terminals whose departures pages feed the vessel directory, in route
    /// table order.
    pub fn departure_terminals(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.routes
            .iter()
            .filter(|route| seen.insert(route.from.clone()))
            .map(|route| route.from.clone())
            .collect()
    }
}
