use ferry_core::{update, CycleEffect, CycleMsg, CycleState, Job};
use pretty_assertions::assert_eq;

fn step(state: CycleState, msg: CycleMsg) -> (CycleState, Vec<CycleEffect>) {
    update(state, msg)
}

#[test]
fn overlapping_scrape_triggers_are_dropped() {
    let (state, effects) = step(CycleState::new(), CycleMsg::Trigger(Job::Scrape));
    assert_eq!(
        effects,
        vec![CycleEffect::Start {
            job: Job::Scrape,
            cycle_id: 1
        }]
    );

    let (state, effects) = step(state, CycleMsg::Trigger(Job::Scrape));
    assert!(effects.is_empty());
    assert_eq!(state.dropped_triggers(), 1);
    assert_eq!(state.running(Job::Scrape), Some(1));
}

#[test]
fn different_jobs_run_side_by_side() {
    let (state, _) = step(CycleState::new(), CycleMsg::Trigger(Job::Scrape));
    let (state, effects) = step(state, CycleMsg::Trigger(Job::Cleanup));

    assert_eq!(
        effects,
        vec![CycleEffect::Start {
            job: Job::Cleanup,
            cycle_id: 2
        }]
    );
    assert_eq!(state.running(Job::Scrape), Some(1));
    assert_eq!(state.running(Job::Cleanup), Some(2));
}

#[test]
fn finishing_frees_the_slot_for_the_next_trigger() {
    let (state, _) = step(CycleState::new(), CycleMsg::Trigger(Job::Scrape));
    let (state, effects) = step(
        state,
        CycleMsg::Finished {
            job: Job::Scrape,
            cycle_id: 1,
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_idle());
    assert_eq!(state.completed(), 1);

    let (state, effects) = step(state, CycleMsg::Trigger(Job::Scrape));
    assert_eq!(
        effects,
        vec![CycleEffect::Start {
            job: Job::Scrape,
            cycle_id: 2
        }]
    );
    assert_eq!(state.running(Job::Scrape), Some(2));
}

#[test]
fn stale_finish_messages_are_ignored() {
    let (state, _) = step(CycleState::new(), CycleMsg::Trigger(Job::Scrape));
    let (state, effects) = step(
        state,
        CycleMsg::Finished {
            job: Job::Scrape,
            cycle_id: 7,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.running(Job::Scrape), Some(1));
    assert_eq!(state.completed(), 0);
}

#[test]
fn shutdown_when_idle_exits_immediately() {
    let (state, effects) = step(CycleState::new(), CycleMsg::ShutdownRequested);
    assert_eq!(effects, vec![CycleEffect::Exit]);
    assert!(state.is_shutting_down());
}

#[test]
fn shutdown_cancels_running_cycles_then_exits_after_the_last() {
    let (state, _) = step(CycleState::new(), CycleMsg::Trigger(Job::Scrape));
    let (state, _) = step(state, CycleMsg::Trigger(Job::Cleanup));

    let (state, effects) = step(state, CycleMsg::ShutdownRequested);
    assert_eq!(
        effects,
        vec![
            CycleEffect::Cancel {
                job: Job::Scrape,
                cycle_id: 1
            },
            CycleEffect::Cancel {
                job: Job::Cleanup,
                cycle_id: 2
            },
        ]
    );

    let (state, effects) = step(state, CycleMsg::Trigger(Job::Scrape));
    assert!(effects.is_empty());
    assert_eq!(state.dropped_triggers(), 1);

    let (state, effects) = step(
        state,
        CycleMsg::Finished {
            job: Job::Cleanup,
            cycle_id: 2,
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = step(
        state,
        CycleMsg::Finished {
            job: Job::Scrape,
            cycle_id: 1,
        },
    );
    assert_eq!(effects, vec![CycleEffect::Exit]);
    assert!(state.is_idle());
}

#[test]
fn repeated_shutdown_requests_are_quiet() {
    let (state, _) = step(CycleState::new(), CycleMsg::ShutdownRequested);
    let (_, effects) = step(state, CycleMsg::ShutdownRequested);
    assert!(effects.is_empty());
}
