//! `ferry.ron` configuration.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ferry_engine::{
    BrowserSettings, PipelineSettings, RenderSettings, SchedulerSettings, SourceUrls,
};
use ferry_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// IANA zone the service day is computed in.
    pub timezone: String,
    pub store_dir: PathBuf,
    /// Replaces the built-in terminal, leg and route tables.
    pub reference_path: Option<PathBuf>,
    pub scrape_interval_minutes: u64,
    pub cleanup_interval_hours: u64,
    pub retention_hours: u32,
    pub route_concurrency: usize,
    pub directory_concurrency: usize,
    pub render: RenderConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Vancouver".to_string(),
            store_dir: PathBuf::from("data/routes"),
            reference_path: None,
            scrape_interval_minutes: 60,
            cleanup_interval_hours: 6,
            retention_hours: 48,
            route_concurrency: 4,
            directory_concurrency: 4,
            render: RenderConfig::default(),
            sources: SourcesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// How pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderBackend {
    /// Headless Chromium; gets past pages that only fill in with scripts.
    Browser,
    /// Plain HTTP GET.
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub backend: RenderBackend,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_bytes: u64,
    pub user_agent: String,
    pub browser_executable: Option<PathBuf>,
    pub browser_launch_timeout_secs: u64,
    pub browser_timeout_secs: u64,
    pub ready_selector: String,
    pub browser_sandbox: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let http = RenderSettings::default();
        let browser = BrowserSettings::default();
        Self {
            backend: RenderBackend::Browser,
            connect_timeout_secs: http.connect_timeout.as_secs(),
            request_timeout_secs: http.request_timeout.as_secs(),
            max_bytes: http.max_bytes,
            user_agent: http.user_agent,
            browser_executable: browser.executable,
            browser_launch_timeout_secs: browser.launch_timeout.as_secs(),
            browser_timeout_secs: browser.request_timeout.as_secs(),
            ready_selector: browser.ready_selector,
            browser_sandbox: browser.sandbox,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    pub schedule_url: String,
    pub departures_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let urls = SourceUrls::default();
        Self {
            schedule_url: urls.schedule_template,
            departures_url: urls.departures_template,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub target: LogTarget,
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Terminal,
            level: "info".to_string(),
            file: PathBuf::from("ferry.log"),
        }
    }
}

/// Loads `path`, or the defaults when it does not exist.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    parse(&text, &path.display().to_string())
}

pub fn parse(text: &str, origin: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = ron::from_str(text).map_err(|err| ConfigError::Parse {
        path: origin.to_string(),
        message: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("scrape_interval_minutes", self.scrape_interval_minutes),
            ("cleanup_interval_hours", self.cleanup_interval_hours),
            ("retention_hours", u64::from(self.retention_hours)),
            ("route_concurrency", self.route_concurrency as u64),
            ("directory_concurrency", self.directory_concurrency as u64),
            ("render.request_timeout_secs", self.render.request_timeout_secs),
            ("render.browser_timeout_secs", self.render.browser_timeout_secs),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }
        if self.render.ready_selector.trim().is_empty() {
            return Err(ConfigError::Invalid("render.ready_selector is empty".to_string()));
        }
        Ok(())
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            connect_timeout: Duration::from_secs(self.render.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.render.request_timeout_secs),
            max_bytes: self.render.max_bytes,
            user_agent: self.render.user_agent.clone(),
            ..RenderSettings::default()
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            executable: self.render.browser_executable.clone(),
            launch_timeout: Duration::from_secs(self.render.browser_launch_timeout_secs),
            request_timeout: Duration::from_secs(self.render.browser_timeout_secs),
            ready_selector: self.render.ready_selector.clone(),
            user_agent: self.render.user_agent.clone(),
            sandbox: self.render.browser_sandbox,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            sources: SourceUrls {
                schedule_template: self.sources.schedule_url.clone(),
                departures_template: self.sources.departures_url.clone(),
            },
            route_concurrency: self.route_concurrency,
            directory_concurrency: self.directory_concurrency,
            retention_hours: self.retention_hours,
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            scrape_interval: Duration::from_secs(self.scrape_interval_minutes * 60),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_hours * 60 * 60),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        let file = self.logging.file.clone();
        match self.logging.target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(file),
            LogTarget::Both => LogDestination::Both(file),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        ferry_logging::parse_level(&self.logging.level)
    }
}
