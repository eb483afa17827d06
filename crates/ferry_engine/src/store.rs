//! Durable latest-snapshot storage, one record per route code.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use ferry_core::{RouteInfo, RouteKey, RouteRecord};
use ferry_logging::{ferry_debug, ferry_warn};
use thiserror::Error;

use crate::persist::AtomicFileWriter;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("store record {path} is not valid json: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid route code {0:?}")]
    InvalidRouteCode(String),
    #[error("store task did not complete: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

/// Where route records live between cycles.
///
/// `upsert` replaces the whole snapshot for a route in one write; upserting
/// the same record twice is the same as upserting it once.
pub trait RouteStore: Send + Sync {
    fn upsert(&self, record: &RouteRecord) -> Result<(), StoreError>;

    /// All records, or only `codes` when given, ordered by route code.
    fn list_routes(&self, codes: Option<&[String]>) -> Result<Vec<RouteRecord>, StoreError>;

    fn get_route(&self, code: &str) -> Result<Option<RouteRecord>, StoreError>;

    /// Removes records whose snapshot date is before `cutoff`.
    fn purge_older_than(&self, cutoff: NaiveDate) -> Result<usize, StoreError>;

    fn list_route_info(&self, codes: Option<&[String]>) -> Result<Vec<RouteInfo>, StoreError> {
        Ok(self
            .list_routes(codes)?
            .iter()
            .map(RouteRecord::info)
            .collect())
    }
}

/// Six alphanumeric characters, which also keeps the code usable as a file
/// name: no separators, no dots.
fn checked_code(code: &str) -> Result<&str, StoreError> {
    let valid = code.chars().all(char::is_alphanumeric) && RouteKey::parse(code).is_some();
    if valid {
        Ok(code)
    } else {
        Err(StoreError::InvalidRouteCode(code.to_string()))
    }
}

fn wanted(codes: Option<&[String]>, code: &str) -> bool {
    codes.map_or(true, |codes| codes.iter().any(|c| c == code))
}

/// Snapshot dates that do not parse are kept.
fn is_older(record: &RouteRecord, cutoff: NaiveDate) -> bool {
    match NaiveDate::parse_from_str(&record.date, "%Y-%m-%d") {
        Ok(date) => date < cutoff,
        Err(_) => {
            ferry_warn!(
                "Route {} has unparseable date {:?}; keeping it",
                record.route_code,
                record.date
            );
            false
        }
    }
}

/// One pretty-printed `<ROUTECODE>.json` file per route.
#[derive(Debug)]
pub struct JsonFileStore {
    writer: AtomicFileWriter,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    fn path_for(&self, code: &str) -> PathBuf {
        self.dir().join(format!("{code}.json"))
    }

    fn io_error(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn read_record(&self, path: &Path) -> Result<RouteRecord, StoreError> {
        let bytes = fs::read(path).map_err(|err| Self::io_error(path, err))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.dir();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::io_error(dir, err)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| Self::io_error(dir, err))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every readable record together with the file it came from.
    fn all_records(&self) -> Result<Vec<(PathBuf, RouteRecord)>, StoreError> {
        let mut records = Vec::new();
        for path in self.record_paths()? {
            match self.read_record(&path) {
                Ok(record) => records.push((path, record)),
                Err(err) => ferry_warn!("Skipping unreadable route file: {}", err),
            }
        }
        records.sort_by(|(_, a), (_, b)| a.route_code.cmp(&b.route_code));
        Ok(records)
    }
}

impl RouteStore for JsonFileStore {
    fn upsert(&self, record: &RouteRecord) -> Result<(), StoreError> {
        let code = checked_code(&record.route_code)?;
        let body = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Json {
            path: code.to_string(),
            source,
        })?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self
            .writer
            .write(&format!("{code}.json"), &body)
            .map_err(|err| Self::io_error(&self.path_for(code), err))?;
        ferry_debug!("Wrote {} sailings to {:?}", record.sailings.len(), path);
        Ok(())
    }

    fn list_routes(&self, codes: Option<&[String]>) -> Result<Vec<RouteRecord>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .all_records()?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| wanted(codes, &record.route_code))
            .collect())
    }

    fn get_route(&self, code: &str) -> Result<Option<RouteRecord>, StoreError> {
        let code = checked_code(code)?;
        let path = self.path_for(code);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !path.exists() {
            return Ok(None);
        }
        self.read_record(&path).map(Some)
    }

    fn purge_older_than(&self, cutoff: NaiveDate) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for (path, record) in self.all_records()? {
            if !is_older(&record, cutoff) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Self::io_error(&path, err)),
            }
        }
        Ok(removed)
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    routes: Mutex<BTreeMap<String, RouteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RouteStore for MemoryStore {
    fn upsert(&self, record: &RouteRecord) -> Result<(), StoreError> {
        let code = checked_code(&record.route_code)?;
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.to_string(), record.clone());
        Ok(())
    }

    fn list_routes(&self, codes: Option<&[String]>) -> Result<Vec<RouteRecord>, StoreError> {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(routes
            .values()
            .filter(|record| wanted(codes, &record.route_code))
            .cloned()
            .collect())
    }

    fn get_route(&self, code: &str) -> Result<Option<RouteRecord>, StoreError> {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(routes.get(code).cloned())
    }

    fn purge_older_than(&self, cutoff: NaiveDate) -> Result<usize, StoreError> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let before = routes.len();
        routes.retain(|_, record| !is_older(record, cutoff));
        Ok(before - routes.len())
    }
}
