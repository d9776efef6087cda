//! Built-in markup adapter, end to end through the manager

use std::sync::Arc;

use archipelago_islands::{
    AdapterKind, ContainerRef, CreateIsland, IslandError, IslandManager, IslandState,
    MarkupAdapter, MarkupComponent, MemoryHost, RegisterOptions,
};
use serde_json::json;

use crate::common::{id, props};

fn manager_with_button() -> (IslandManager, MemoryHost) {
    let host = MemoryHost::new();
    let mut manager = IslandManager::new(host.clone());
    manager.register_adapter(Arc::new(MarkupAdapter::new(host.clone())));
    manager
        .register(
            "Button",
            MarkupComponent::template("<button class=\"btn\">{label}</button>").into_factory(),
            RegisterOptions::new(AdapterKind::Vanilla),
        )
        .unwrap();
    host.insert_container(ContainerRef::new("island-b1"));
    manager
        .create_island(CreateIsland::new(id("b1"), "Button").props(props(json!({"label": "Go & see"}))))
        .unwrap();
    (manager, host)
}

#[tokio::test]
async fn renders_hydrates_and_clears_container() {
    let (mut manager, host) = manager_with_button();
    let container = ContainerRef::new("island-b1");

    manager.mount_island("b1").await.unwrap();
    assert_eq!(
        host.markup(&container).as_deref(),
        Some("<button class=\"btn\">Go &amp; see</button>")
    );
    assert!(!host.is_interactive(&container));

    manager.hydrate_island("b1").await.unwrap();
    assert!(host.is_interactive(&container));

    manager.unmount_island("b1").unwrap();
    let slot = host.slot(&container).unwrap();
    assert!(slot.markup.is_empty());
    assert!(slot.owner.is_none());
}

#[tokio::test]
async fn hydration_mismatch_keeps_island_mounted() {
    let (mut manager, host) = manager_with_button();
    let container = ContainerRef::new("island-b1");
    manager.mount_island("b1").await.unwrap();

    host.attach(&container, AdapterKind::Vanilla, "<button>edited</button>".into())
        .unwrap();
    let err = manager.hydrate_island("b1").await.unwrap_err();

    assert!(matches!(err, IslandError::HydrateFailed { .. }));
    assert!(err.to_string().contains("hydration mismatch"));
    let island = manager.island("b1").unwrap();
    assert_eq!(island.state(), IslandState::Mounted);
    assert!(island.is_errored());
}

#[tokio::test]
async fn missing_container_is_caught_at_create() {
    let (mut manager, _host) = manager_with_button();
    let err = manager
        .create_island(CreateIsland::new(id("b2"), "Button"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Container not found for island b2: island-b2"
    );
}
