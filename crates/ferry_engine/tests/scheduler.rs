mod support;

use std::sync::Arc;
use std::time::Duration;

use ferry_engine::{
    MemoryStore, PipelineSettings, RouteStore, ScrapePipeline, Scheduler, SchedulerSettings,
};
use support::{init_logging, reference, sources, sunday, FakeRenderer};
use tokio_util::sync::CancellationToken;

fn scheduler(store: Arc<MemoryStore>, settings: SchedulerSettings) -> Scheduler {
    let pipeline = ScrapePipeline::new(
        Arc::new(FakeRenderer::standard()),
        store,
        reference(),
        Arc::new(sunday()),
        PipelineSettings {
            sources: sources(),
            ..PipelineSettings::default()
        },
    );
    Scheduler::new(Arc::new(pipeline), settings)
}

#[tokio::test(start_paused = true)]
async fn runs_both_jobs_on_start_and_exits_on_shutdown() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(
        scheduler(store.clone(), SchedulerSettings::default()).run(shutdown.clone()),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown.cancel();
    let state = handle.await.unwrap();

    assert_eq!(state.completed(), 2);
    assert!(state.is_idle());
    assert!(store.get_route("TSAPOB").unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn scrapes_again_on_each_interval() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    let shutdown = CancellationToken::new();
    let settings = SchedulerSettings {
        scrape_interval: Duration::from_secs(60),
        cleanup_interval: Duration::from_secs(6 * 60 * 60),
    };
    let handle = tokio::spawn(scheduler(store, settings).run(shutdown.clone()));

    // Start plus ticks at 60s and 120s, and the initial cleanup.
    tokio::time::sleep(Duration::from_secs(150)).await;
    shutdown.cancel();
    let state = handle.await.unwrap();

    assert_eq!(state.completed(), 4);
    assert_eq!(state.dropped_triggers(), 0);
}
