//! Manager lifecycle tests

use archipelago_islands::{
    AdapterKind, ComponentFactory, CreateIsland, IslandError, IslandState, Priority,
    RegisterOptions,
};
use serde_json::json;

use crate::common::{Call, Fixture, id, props};

#[tokio::test]
async fn button_scenario_walks_the_lifecycle() {
    let mut fx = Fixture::new(AdapterKind::React);
    fx.register("Button", Some(Priority::High));
    fx.add_container("b1");

    let island = fx
        .manager
        .create_island(CreateIsland::new(id("b1"), "Button").props(props(json!({"label": "Go"}))))
        .unwrap();
    assert_eq!(island.priority(), Priority::High);
    assert!(island.hydrate());
    assert_eq!(island.state(), IslandState::Created);

    fx.manager.mount_island("b1").await.unwrap();
    assert_eq!(fx.manager.island("b1").unwrap().state(), IslandState::Mounted);

    fx.manager.hydrate_island("b1").await.unwrap();
    assert_eq!(fx.manager.island("b1").unwrap().state(), IslandState::Hydrated);

    assert_eq!(
        fx.calls(),
        vec![Call::Mount("b1".into()), Call::Hydrate("b1".into())]
    );
}

#[test]
fn registration_round_trips_for_every_name() {
    let mut fx = Fixture::new(AdapterKind::Vue);
    let names = ["Button", "Input", "Modal", "Tabs"];
    let factories: Vec<ComponentFactory> = names
        .iter()
        .map(|name| ComponentFactory::new(name.to_string()))
        .collect();

    for (name, factory) in names.iter().zip(&factories) {
        fx.manager
            .register(*name, factory.clone(), RegisterOptions::new(AdapterKind::Vue))
            .unwrap();
    }
    for (name, factory) in names.iter().zip(&factories) {
        let reg = fx.manager.resolve(name).unwrap();
        assert_eq!(reg.name(), *name);
        assert!(reg.factory().ptr_eq(factory));
    }

    fx.manager.unregister("Modal");
    assert!(matches!(
        fx.manager.resolve("Modal"),
        Err(IslandError::UnknownComponent { .. })
    ));
    assert_eq!(fx.manager.registry().names(), vec!["Button", "Input", "Tabs"]);
}

#[test]
fn unknown_component_creates_nothing() {
    let mut fx = Fixture::new(AdapterKind::React);
    fx.add_container("x");

    let err = fx
        .manager
        .create_island(CreateIsland::new(id("x"), "Ghost"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Component \"Ghost\" not found in registry");
    assert!(fx.manager.island("x").is_none());
    assert!(fx.manager.is_empty());
}

#[tokio::test]
async fn id_is_reusable_only_after_unmount() {
    let mut fx = Fixture::new(AdapterKind::React);
    fx.register("Button", None);
    fx.place("b1", "Button");

    assert!(matches!(
        fx.manager.create_island(CreateIsland::new(id("b1"), "Button")),
        Err(IslandError::DuplicateIsland { .. })
    ));

    fx.manager.mount_island("b1").await.unwrap();
    fx.manager.hydrate_island("b1").await.unwrap();
    fx.manager.unmount_island("b1").unwrap();

    let again = fx
        .manager
        .create_island(CreateIsland::new(id("b1"), "Button").hydrate(false))
        .unwrap();
    assert_eq!(again.state(), IslandState::Created);
    assert!(!again.hydrate());
}

#[tokio::test]
async fn unmount_twice_is_harmless() {
    let mut fx = Fixture::new(AdapterKind::Svelte);
    fx.register("Card", None);
    fx.place("c1", "Card");
    fx.manager.mount_island("c1").await.unwrap();

    fx.manager.unmount_island("c1").unwrap();
    fx.manager.unmount_island("c1").unwrap();

    assert_eq!(fx.manager.island("c1").unwrap().state(), IslandState::Unmounted);
    assert_eq!(
        fx.calls(),
        vec![Call::Mount("c1".into()), Call::Unmount("c1".into())]
    );
}

#[tokio::test]
async fn teardown_errors_are_swallowed() {
    let mut fx = Fixture::with_adapter(AdapterKind::Angular, |adapter| adapter.failing_unmount());
    fx.register("Grid", None);
    fx.place("g1", "Grid");
    fx.manager.mount_island("g1").await.unwrap();

    fx.manager.unmount_island("g1").unwrap();
    let island = fx.manager.island("g1").unwrap();
    assert_eq!(island.state(), IslandState::Unmounted);
    assert!(!island.has_instance());
}

#[tokio::test]
async fn mount_failure_marker_clears_on_retry() {
    let mut fx = Fixture::with_adapter(AdapterKind::React, |adapter| adapter.failing_mount("b1"));
    fx.register("Button", None);
    fx.place("b1", "Button");

    let err = fx.manager.mount_island("b1").await.unwrap_err();
    assert!(err.is_adapter_failure());
    let island = fx.manager.island("b1").unwrap();
    assert_eq!(island.state(), IslandState::Created);
    assert!(island.is_errored());

    // Swap in a well-behaved adapter of the same kind and retry.
    let replacement = crate::common::RecordingAdapter::new(AdapterKind::React, &fx.log);
    fx.manager.register_adapter(std::sync::Arc::new(replacement));
    fx.manager.mount_island("b1").await.unwrap();
    let island = fx.manager.island("b1").unwrap();
    assert_eq!(island.state(), IslandState::Mounted);
    assert!(!island.is_errored());
}

#[test]
fn serialized_island_round_trips() {
    let mut fx = Fixture::new(AdapterKind::Vue);
    fx.register("Input", Some(Priority::Low));
    fx.add_container("i1");
    fx.manager
        .create_island(
            CreateIsland::new(id("i1"), "Input")
                .props(props(json!({"placeholder": "Name", "maxLength": 40})))
                .hydrate(false),
        )
        .unwrap();

    let original = fx.manager.island("i1").unwrap().transport();
    let payload = fx.manager.serialize_island("i1").unwrap();
    let restored = fx.manager.deserialize_island(&payload).unwrap();

    assert_eq!(restored.transport(), original);
    assert_eq!(restored.state(), IslandState::Created);
    assert!(!restored.has_instance());

    let wire: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(wire["framework"], json!("vue"));
    assert_eq!(wire["priority"], json!("low"));
    assert!(wire.get("container").is_none());
}

#[tokio::test]
async fn resumed_island_mounts_like_a_created_one() {
    let mut server = Fixture::new(AdapterKind::React);
    server.register("Button", Some(Priority::High));
    server.add_container("b1");
    server
        .manager
        .create_island(CreateIsland::new(id("b1"), "Button").props(props(json!({"label": "Go"}))))
        .unwrap();
    let payload = server.manager.serialize_island("b1").unwrap();

    let mut client = Fixture::new(AdapterKind::React);
    client.register("Button", None);
    client.add_container("b1");
    let resumed = client.manager.resume_island(&payload).unwrap();
    assert_eq!(resumed.priority(), Priority::High);

    client.manager.mount_island("b1").await.unwrap();
    client.manager.hydrate_island("b1").await.unwrap();
    assert_eq!(client.hydrated(), vec!["b1"]);
}
