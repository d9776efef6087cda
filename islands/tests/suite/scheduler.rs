//! Hydration scheduler tests

use std::sync::{Arc, Mutex};

use archipelago_islands::{AdapterKind, HydrationScheduler, IslandError, IslandState, Priority};

use crate::common::{Fixture, id};

fn four_islands(fx: &mut Fixture) {
    fx.register("Low", Some(Priority::Low));
    fx.register("High", Some(Priority::High));
    fx.register("Normal", None);
    fx.place("A", "Low");
    fx.place("B", "High");
    fx.place("C", "Normal");
    fx.place("D", "High");
}

#[tokio::test]
async fn higher_tiers_hydrate_first() {
    let mut fx = Fixture::new(AdapterKind::React);
    four_islands(&mut fx);

    let report = HydrationScheduler::new().run_all(&mut fx.manager).await;

    assert_eq!(fx.hydrated(), vec!["B", "D", "C", "A"]);
    assert_eq!(report.hydrated, vec![id("B"), id("D"), id("C"), id("A")]);
    assert!(report.is_clean());
}

#[tokio::test]
async fn failing_island_is_isolated_and_reported_once() {
    let mut fx = Fixture::with_adapter(AdapterKind::React, |adapter| adapter.failing_hydrate("C"));
    four_islands(&mut fx);

    let completed: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
    let errors: Arc<Mutex<Vec<String>>> = Arc::default();
    let completed_hook = Arc::clone(&completed);
    let errors_hook = Arc::clone(&errors);
    let mut scheduler = HydrationScheduler::new()
        .on_error(move |failure| {
            errors_hook
                .lock()
                .expect("errors lock")
                .push(failure.id.clone());
        })
        .on_complete(move |report| {
            completed_hook
                .lock()
                .expect("completed lock")
                .push(report.failures.iter().map(|f| f.id.clone()).collect());
        });

    let report = scheduler.run_all(&mut fx.manager).await;

    assert_eq!(fx.hydrated(), vec!["B", "D", "C", "A"]);
    for hydrated in ["A", "B", "D"] {
        assert_eq!(
            fx.manager.island(hydrated).unwrap().state(),
            IslandState::Hydrated
        );
    }
    let c = fx.manager.island("C").unwrap();
    assert_eq!(c.state(), IslandState::Mounted);
    assert!(c.is_errored());

    assert_eq!(*errors.lock().unwrap(), vec!["C"]);
    assert_eq!(*completed.lock().unwrap(), vec![vec!["C".to_string()]]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        IslandError::HydrateFailed { .. }
    ));
}

#[tokio::test]
async fn explicit_batch_only_touches_named_islands() {
    let mut fx = Fixture::new(AdapterKind::Vue);
    four_islands(&mut fx);

    let report = HydrationScheduler::new()
        .run(&mut fx.manager, [id("A"), id("D"), id("missing")])
        .await;

    assert_eq!(fx.hydrated(), vec!["D", "A"]);
    assert_eq!(fx.manager.island("B").unwrap().state(), IslandState::Created);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "missing");
    assert_eq!(report.failures[0].error.kind(), "island_not_found");
}

#[tokio::test]
async fn unmounted_islands_are_left_out_of_run_all() {
    let mut fx = Fixture::new(AdapterKind::Svelte);
    four_islands(&mut fx);
    fx.manager.mount_island("B").await.unwrap();
    fx.manager.unmount_island("B").unwrap();

    let report = HydrationScheduler::new().run_all(&mut fx.manager).await;

    assert_eq!(fx.hydrated(), vec!["D", "C", "A"]);
    assert_eq!(report.hydrated_count(), 3);
    assert_eq!(fx.manager.island("B").unwrap().state(), IslandState::Unmounted);
}
