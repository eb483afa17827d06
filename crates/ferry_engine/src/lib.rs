//! Ferry engine: page rendering, extraction, storage and cycle execution.
mod browser;
mod decode;
mod departures;
mod persist;
mod pipeline;
mod render;
mod schedule;
mod scheduler;
mod sources;
mod store;
mod types;

pub use browser::{BrowserSettings, ChromeRenderer};
pub use decode::decode_body;
pub use departures::{build_vessel_directory, fetch_terminal_departures, parse_departures};
pub use persist::{ensure_dir, AtomicFileWriter};
pub use pipeline::{PipelineSettings, RouteError, ScrapePipeline};
pub use render::{RenderSettings, Renderer, ReqwestRenderer};
pub use schedule::{parse_schedule_page, ScheduleError};
pub use scheduler::{Scheduler, SchedulerSettings};
pub use sources::{SourceUrls, DEFAULT_DEPARTURES_TEMPLATE, DEFAULT_SCHEDULE_TEMPLATE};
pub use store::{JsonFileStore, MemoryStore, RouteStore, StoreError};
pub use types::{CycleReport, FailureKind, RenderError, RouteOutcome};
