//! One scrape cycle: vessel directory first, then every route.

use std::sync::Arc;

use chrono::TimeDelta;
use ferry_core::{
    assemble_route, Clock, ReferenceData, RouteContext, RouteKey, ServiceDay, VesselDirectory,
};
use ferry_logging::{ferry_info, ferry_warn};
use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::departures::build_vessel_directory;
use crate::render::Renderer;
use crate::schedule::{parse_schedule_page, ScheduleError};
use crate::sources::SourceUrls;
use crate::store::{RouteStore, StoreError};
use crate::types::{CycleReport, RenderError, RouteOutcome};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("schedule page unusable: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub sources: SourceUrls,
    /// Routes scraped at once.
    pub route_concurrency: usize,
    /// Departures pages fetched at once while building the directory.
    pub directory_concurrency: usize,
    pub retention_hours: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sources: SourceUrls::default(),
            route_concurrency: 4,
            directory_concurrency: 4,
            retention_hours: 48,
        }
    }
}

pub struct ScrapePipeline {
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn RouteStore>,
    reference: Arc<ReferenceData>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
}

impl ScrapePipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn RouteStore>,
        reference: Arc<ReferenceData>,
        clock: Arc<dyn Clock>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            renderer,
            store,
            reference,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn RouteStore> {
        &self.store
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs a full cycle for today. Failures are confined to the route or
    /// terminal they happen in; the report says how the cycle went.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let day = self.clock.today();
        let mut report = CycleReport {
            date: day.iso_date(),
            ..CycleReport::default()
        };
        ferry_info!(
            "Scrape cycle for {} ({}) starting with reference data v{}",
            report.date,
            day.weekday_name(),
            self.reference.version()
        );

        let terminals = self.reference.departure_terminals();
        let directory = build_vessel_directory(
            self.renderer.as_ref(),
            &self.settings.sources,
            &terminals,
            self.settings.directory_concurrency,
            cancel,
        )
        .await;
        report.directory_terminals = directory.terminal_count();
        report.directory_departures = directory.departure_count();

        let scrapes: Vec<_> = self
            .reference
            .routes()
            .iter()
            .map(|route| self.scrape_route(route, &directory, day, cancel))
            .collect();
        let outcomes: Vec<RouteOutcome> = stream::iter(scrapes)
            .buffer_unordered(self.settings.route_concurrency.max(1))
            .collect()
            .await;
        for outcome in &outcomes {
            report.record(outcome);
        }

        if report.was_cancelled() {
            ferry_warn!("Scrape cycle cancelled: {}", report);
        } else {
            ferry_info!("Scrape cycle finished: {}", report);
        }
        report
    }

    /// Scrapes and stores one route against an already built directory.
    pub async fn scrape_route(
        &self,
        route: &RouteKey,
        directory: &VesselDirectory,
        day: ServiceDay,
        cancel: &CancellationToken,
    ) -> RouteOutcome {
        let route_code = route.code();
        match self.try_scrape_route(route, directory, day, cancel).await {
            Ok(sailings) => {
                ferry_info!("{} scraped with {} sailing(s)", route_code, sailings);
                RouteOutcome::Saved {
                    route_code,
                    sailings,
                }
            }
            Err(RouteError::Cancelled) => RouteOutcome::Cancelled { route_code },
            Err(err) => {
                ferry_warn!("Skipping route {}: {}", route_code, err);
                RouteOutcome::Failed {
                    route_code,
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn try_scrape_route(
        &self,
        route: &RouteKey,
        directory: &VesselDirectory,
        day: ServiceDay,
        cancel: &CancellationToken,
    ) -> Result<usize, RouteError> {
        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }
        let url = self.settings.sources.schedule_url(route)?;
        let html = self
            .renderer
            .render(url.as_str(), cancel)
            .await
            .map_err(|err| {
                if err.is_cancelled() {
                    RouteError::Cancelled
                } else {
                    RouteError::Render(err)
                }
            })?;

        let page = parse_schedule_page(&html, &day)?;
        let ctx = RouteContext {
            reference: self.reference.as_ref(),
            directory,
            route,
            day,
        };
        let record = assemble_route(&ctx, page);

        // A cancelled cycle persists nothing further.
        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }
        let sailings = record.sailings.len();
        self.with_store(move |store| store.upsert(&record)).await?;
        Ok(sailings)
    }

    /// Deletes snapshots older than the retention window.
    pub async fn run_cleanup(&self) -> Result<usize, StoreError> {
        let today = self.clock.today().date();
        let retention_days = i64::from(self.settings.retention_hours.div_ceil(24));
        let cutoff = today - TimeDelta::days(retention_days);
        let removed = self
            .with_store(move |store| store.purge_older_than(cutoff))
            .await?;
        ferry_info!("Cleanup removed {} route(s) dated before {}", removed, cutoff);
        Ok(removed)
    }

    /// Runs a store call on the blocking pool; file stores write and sync.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RouteStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref())).await?
    }
}
