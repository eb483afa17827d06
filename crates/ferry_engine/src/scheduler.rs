//! Executes cycle effects decided by [`ferry_core::update`].
//!
//! Timers and finished cycles become messages; the pure state machine
//! decides what to start, cancel, or whether to exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ferry_core::{update, CycleEffect, CycleId, CycleMsg, CycleState, Job};
use ferry_logging::{ferry_debug, ferry_error, ferry_info};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::pipeline::ScrapePipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub scrape_interval: Duration,
    pub cleanup_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            scrape_interval: Duration::from_secs(60 * 60),
            cleanup_interval: Duration::from_secs(6 * 60 * 60),
        }
    }
}

pub struct Scheduler {
    pipeline: Arc<ScrapePipeline>,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(pipeline: Arc<ScrapePipeline>, settings: SchedulerSettings) -> Self {
        Self { pipeline, settings }
    }

    /// Runs both jobs on start and then on their intervals until `shutdown`
    /// fires and every running cycle has returned.
    pub async fn run(self, shutdown: CancellationToken) -> CycleState {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CycleMsg>();
        let mut scrape_timer = interval(self.settings.scrape_interval);
        let mut cleanup_timer = interval(self.settings.cleanup_interval);
        scrape_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        cleanup_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut state = CycleState::new();
        let mut running: HashMap<Job, (CycleId, CancellationToken)> = HashMap::new();
        let mut shutdown_seen = false;

        loop {
            let msg = tokio::select! {
                _ = shutdown.cancelled(), if !shutdown_seen => {
                    shutdown_seen = true;
                    CycleMsg::ShutdownRequested
                }
                Some(msg) = done_rx.recv() => msg,
                _ = scrape_timer.tick() => CycleMsg::Trigger(Job::Scrape),
                _ = cleanup_timer.tick() => CycleMsg::Trigger(Job::Cleanup),
            };

            let dropped_before = state.dropped_triggers();
            let (next, effects) = update(state, msg);
            state = next;
            if state.dropped_triggers() > dropped_before {
                ferry_debug!("Trigger dropped; a cycle of that kind is still running");
            }
            running.retain(|job, (cycle_id, _)| state.running(*job) == Some(*cycle_id));

            let mut exit = false;
            for effect in effects {
                match effect {
                    CycleEffect::Start { job, cycle_id } => {
                        let cancel = CancellationToken::new();
                        running.insert(job, (cycle_id, cancel.clone()));
                        self.spawn_job(job, cycle_id, cancel, done_tx.clone());
                    }
                    CycleEffect::Cancel { job, cycle_id } => {
                        ferry_info!("Cancelling {:?} cycle {}", job, cycle_id);
                        if let Some((_, cancel)) = running.get(&job) {
                            cancel.cancel();
                        }
                    }
                    CycleEffect::Exit => exit = true,
                }
            }
            if exit {
                break;
            }
        }

        ferry_info!(
            "Scheduler stopped after {} cycle(s), {} dropped trigger(s)",
            state.completed(),
            state.dropped_triggers()
        );
        state
    }

    fn spawn_job(
        &self,
        job: Job,
        cycle_id: CycleId,
        cancel: CancellationToken,
        done: mpsc::UnboundedSender<CycleMsg>,
    ) {
        let pipeline = Arc::clone(&self.pipeline);
        ferry_info!("Starting {:?} cycle {}", job, cycle_id);
        tokio::spawn(async move {
            let work = tokio::spawn(run_job(pipeline, job, cancel));
            if let Err(err) = work.await {
                ferry_error!("{:?} cycle {} aborted: {}", job, cycle_id, err);
            }
            let _ = done.send(CycleMsg::Finished { job, cycle_id });
        });
    }
}

async fn run_job(pipeline: Arc<ScrapePipeline>, job: Job, cancel: CancellationToken) {
    match job {
        Job::Scrape => {
            pipeline.run_cycle(&cancel).await;
        }
        Job::Cleanup => {
            if let Err(err) = pipeline.run_cleanup().await {
                ferry_error!("Cleanup failed: {}", err);
            }
        }
    }
}
