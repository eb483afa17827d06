//! Pure state machine behind the scheduler.
//!
//! Each job kind runs single-flight: a trigger that arrives while a cycle of
//! the same kind is running is dropped, because cycles of one kind write the
//! same rows and share one vessel directory.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {
    /// Full scrape: vessel directory, then every route.
    Scrape,
    /// Purge snapshots older than the retention window.
    Cleanup,
}

pub type CycleId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleMsg {
    /// A timer fired or a manual run was requested.
    Trigger(Job),
    /// A running cycle returned, successfully or not.
    Finished { job: Job, cycle_id: CycleId },
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEffect {
    Start { job: Job, cycle_id: CycleId },
    Cancel { job: Job, cycle_id: CycleId },
    /// Nothing is running and shutdown was requested.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleState {
    next_id: CycleId,
    scrape: Option<CycleId>,
    cleanup: Option<CycleId>,
    shutting_down: bool,
    dropped_triggers: u64,
    completed: u64,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self, job: Job) -> Option<CycleId> {
        match job {
            Job::Scrape => self.scrape,
            Job::Cleanup => self.cleanup,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scrape.is_none() && self.cleanup.is_none()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub fn dropped_triggers(&self) -> u64 {
        self.dropped_triggers
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    fn slot(&mut self, job: Job) -> &mut Option<CycleId> {
        match job {
            Job::Scrape => &mut self.scrape,
            Job::Cleanup => &mut self.cleanup,
        }
    }
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: CycleState, msg: CycleMsg) -> (CycleState, Vec<CycleEffect>) {
    let effects = match msg {
        CycleMsg::Trigger(job) => {
            if state.shutting_down || state.running(job).is_some() {
                state.dropped_triggers += 1;
                Vec::new()
            } else {
                state.next_id += 1;
                let cycle_id = state.next_id;
                *state.slot(job) = Some(cycle_id);
                vec![CycleEffect::Start { job, cycle_id }]
            }
        }
        CycleMsg::Finished { job, cycle_id } => {
            if state.running(job) != Some(cycle_id) {
                return (state, Vec::new());
            }
            *state.slot(job) = None;
            state.completed += 1;
            if state.shutting_down && state.is_idle() {
                vec![CycleEffect::Exit]
            } else {
                Vec::new()
            }
        }
        CycleMsg::ShutdownRequested => {
            if state.shutting_down {
                return (state, Vec::new());
            }
            state.shutting_down = true;
            let mut effects: Vec<CycleEffect> = [Job::Scrape, Job::Cleanup]
                .into_iter()
                .filter_map(|job| {
                    state
                        .running(job)
                        .map(|cycle_id| CycleEffect::Cancel { job, cycle_id })
                })
                .collect();
            if effects.is_empty() {
                effects.push(CycleEffect::Exit);
            }
            effects
        }
    };
    (state, effects)
}
