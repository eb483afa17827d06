mod support;

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use chrono::NaiveDate;
use ferry_core::{RouteRecord, UNKNOWN_VESSEL};
use ferry_engine::{MemoryStore, PipelineSettings, RouteStore, ScrapePipeline, StoreError};
use pretty_assertions::assert_eq;
use support::{init_logging, reference, sources, sunday, FakeRenderer};
use tokio_util::sync::CancellationToken;

fn pipeline(renderer: Arc<FakeRenderer>, store: Arc<dyn RouteStore>) -> ScrapePipeline {
    ScrapePipeline::new(
        renderer,
        store,
        reference(),
        Arc::new(sunday()),
        PipelineSettings {
            sources: sources(),
            route_concurrency: 2,
            directory_concurrency: 2,
            retention_hours: 48,
        },
    )
}

fn stale_record(code: &str, date: &str) -> RouteRecord {
    RouteRecord {
        date: date.to_string(),
        route_code: code.to_string(),
        from_terminal_code: code[..3].to_string(),
        to_terminal_code: code[3..].to_string(),
        sailing_duration: "55m".to_string(),
        sailings: Vec::new(),
    }
}

#[tokio::test]
async fn cycle_saves_good_routes_and_isolates_failures() {
    init_logging();
    let renderer = Arc::new(FakeRenderer::standard());
    let store = Arc::new(MemoryStore::new());
    store.upsert(&stale_record("TSAPSB", "2025-09-27")).unwrap();

    let report = pipeline(renderer.clone(), store.clone())
        .run_cycle(&CancellationToken::new())
        .await;

    assert_eq!(report.date, "2025-09-28");
    assert_eq!(report.directory_terminals, 1);
    assert_eq!(report.directory_departures, 2);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.cancelled, 0);
    assert_eq!(report.sailings, 2);

    // The failed route keeps its previous snapshot.
    let kept = store.get_route("TSAPSB").unwrap().unwrap();
    assert_eq!(kept.date, "2025-09-27");

    // Departures are fetched before any schedule page.
    let requests = renderer.requests();
    assert_eq!(
        requests[0],
        "http://ferry.test/departures?terminalCode=TSA"
    );
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn saved_route_carries_derived_legs_and_aggregates() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    pipeline(Arc::new(FakeRenderer::standard()), store.clone())
        .run_cycle(&CancellationToken::new())
        .await;

    let record = store.get_route("TSAPOB").unwrap().expect("route saved");
    assert_eq!(record.from_terminal_code, "TSA");
    assert_eq!(record.to_terminal_code, "POB");
    assert_eq!(record.sailing_duration, "2h 15m");
    assert_eq!(record.sailings.len(), 2);

    let stop = &record.sailings[0];
    assert_eq!(stop.id, "TSAPOB-2025-09-28-0700");
    assert_eq!(stop.status, "Only on Sep 14, 28 & Oct 12 | Foot passengers only");
    assert_eq!(stop.legs.len(), 2);
    assert_eq!(stop.legs[0].vessel_name.as_deref(), Some("Queen of Cumberland"));
    assert_eq!(stop.legs[1].vessel_name, stop.legs[0].vessel_name);
    assert_eq!(stop.total_travel_min, 95);
    assert_eq!(stop.total_dwell_min, 40);
    assert_eq!(stop.avg_dwell_per_stop_min, Some(40));

    let transfer = &record.sailings[1];
    assert_eq!(transfer.id, "TSAPOB-2025-09-28-1130");
    assert_eq!(transfer.legs.len(), 3);
    assert_eq!(transfer.legs[0].vessel_name.as_deref(), Some(UNKNOWN_VESSEL));
    // Mayne and Saturna were never fetched, so their lookups come back unknown.
    assert_eq!(transfer.legs[1].vessel_name.as_deref(), Some(UNKNOWN_VESSEL));
    assert_eq!(transfer.legs[2].vessel_name.as_deref(), Some(UNKNOWN_VESSEL));
    assert_eq!(transfer.total_travel_min, 145);
    assert_eq!(transfer.stop_count, 1);
    assert_eq!(transfer.avg_dwell_per_stop_min, Some(10));
}

#[tokio::test]
async fn cancelled_cycle_persists_nothing() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = pipeline(Arc::new(FakeRenderer::standard()), store.clone())
        .run_cycle(&cancel)
        .await;

    assert_eq!(report.directory_departures, 0);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.cancelled, 2);
    assert_eq!(report.saved, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn directory_failures_still_let_routes_publish() {
    init_logging();
    let renderer = FakeRenderer::new()
        .with_page("http://ferry.test/seasonal/TSA-POB", support::SCHEDULE_TSA_POB);
    let store = Arc::new(MemoryStore::new());

    let report = pipeline(Arc::new(renderer), store.clone())
        .run_cycle(&CancellationToken::new())
        .await;

    assert_eq!(report.directory_terminals, 1);
    assert_eq!(report.directory_departures, 0);
    let record = store.get_route("TSAPOB").unwrap().unwrap();
    assert_eq!(
        record.sailings[0].legs[0].vessel_name.as_deref(),
        Some(UNKNOWN_VESSEL)
    );
}

#[tokio::test]
async fn cleanup_purges_outside_retention() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    store.upsert(&stale_record("TSAPOB", "2025-09-28")).unwrap();
    store.upsert(&stale_record("TSAPSB", "2025-09-26")).unwrap();
    store.upsert(&stale_record("POBTSA", "2025-09-25")).unwrap();

    let removed = pipeline(Arc::new(FakeRenderer::new()), store.clone())
        .run_cleanup()
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get_route("POBTSA").unwrap(), None);
}

/// Remembers which threads wrote or purged.
#[derive(Default)]
struct ThreadRecordingStore {
    inner: MemoryStore,
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingStore {
    fn note_thread(&self) {
        self.threads.lock().unwrap().push(thread::current().id());
    }
}

impl RouteStore for ThreadRecordingStore {
    fn upsert(&self, record: &RouteRecord) -> Result<(), StoreError> {
        self.note_thread();
        self.inner.upsert(record)
    }

    fn list_routes(&self, codes: Option<&[String]>) -> Result<Vec<RouteRecord>, StoreError> {
        self.inner.list_routes(codes)
    }

    fn get_route(&self, code: &str) -> Result<Option<RouteRecord>, StoreError> {
        self.inner.get_route(code)
    }

    fn purge_older_than(&self, cutoff: NaiveDate) -> Result<usize, StoreError> {
        self.note_thread();
        self.inner.purge_older_than(cutoff)
    }
}

#[tokio::test]
async fn store_writes_stay_off_the_async_thread() {
    init_logging();
    let store = Arc::new(ThreadRecordingStore::default());
    let pipeline = pipeline(Arc::new(FakeRenderer::standard()), store.clone());

    let report = pipeline.run_cycle(&CancellationToken::new()).await;
    pipeline.run_cleanup().await.unwrap();

    assert_eq!(report.saved, 1);
    let runtime_thread = thread::current().id();
    let threads = store.threads.lock().unwrap().clone();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}
