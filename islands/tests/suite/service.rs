//! Island service request/response tests

use std::sync::Arc;

use archipelago_islands::{
    AdapterKind, ContainerRef, IslandError, IslandManager, IslandRequest, IslandService,
    MarkupAdapter, MarkupComponent, MemoryHost, Priority, RegisterOptions,
};
use serde_json::json;

fn service(ids: &[&str]) -> IslandService {
    let host = MemoryHost::new();
    for raw in ids {
        host.insert_container(ContainerRef::new(format!("island-{raw}")));
    }
    let mut manager = IslandManager::new(host.clone());
    manager.register_adapter(Arc::new(MarkupAdapter::new(host)));
    manager
        .register(
            "Button",
            MarkupComponent::template("<button>{label}</button>").into_factory(),
            RegisterOptions::new(AdapterKind::Vanilla).priority(Priority::High),
        )
        .unwrap();
    manager
        .register(
            "Input",
            MarkupComponent::template("<input placeholder=\"{placeholder}\">").into_factory(),
            RegisterOptions::new(AdapterKind::Vanilla),
        )
        .unwrap();
    IslandService::new(manager)
}

fn requests(value: serde_json::Value) -> Vec<IslandRequest> {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn batch_then_hydrate_all() {
    let mut service = service(&["name", "submit"]);
    let batch = service
        .create_batch(requests(json!([
            {"id": "name", "component": "Input", "props": {"placeholder": "Name"}},
            {"id": "submit", "component": "Button", "props": {"label": "Send"}}
        ])))
        .unwrap();
    assert_eq!(batch.islands.len(), 2);
    assert_eq!(batch.message, "2 islands created successfully");

    let summary = service.hydrate_all().await;
    assert_eq!(summary.hydrated_count, 2);
    assert!(summary.failures.is_empty());
    assert_eq!(
        serde_json::to_value(&summary).unwrap(),
        json!({"hydratedCount": 2, "message": "2 islands hydrated successfully"})
    );

    let stats = service.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.hydrated, 2);
}

#[test]
fn failed_batch_leaves_no_islands_behind() {
    let mut service = service(&["a", "b"]);
    let err = service
        .create_batch(requests(json!([
            {"id": "a", "component": "Button"},
            {"id": "b", "component": "Carousel"}
        ])))
        .unwrap_err();
    assert!(matches!(err, IslandError::UnknownComponent { .. }));
    assert!(service.list().is_empty());
    assert_eq!(service.stats().total, 0);
}

#[test]
fn summaries_serialize_in_wire_shape() {
    let mut service = service(&["b1"]);
    let summary = service
        .create(
            serde_json::from_value(json!({
                "id": "b1",
                "component": "Button",
                "props": {"label": "Go"},
                "ssr": false
            }))
            .unwrap(),
        )
        .unwrap();

    let wire = serde_json::to_value(&summary).unwrap();
    assert_eq!(wire["id"], json!("b1"));
    assert_eq!(
        wire["html"],
        json!("<div id=\"island-b1\" data-island=\"b1\" data-component=\"Button\"></div>")
    );
    assert_eq!(wire["props"], json!({"label": "Go"}));
    assert_eq!(wire["metadata"]["component"], json!("Button"));
    assert_eq!(wire["metadata"]["priority"], json!("high"));
    assert_eq!(wire["metadata"]["hydrate"], json!(true));
    assert_eq!(wire["metadata"]["ssr"], json!(false));
    assert_eq!(wire["metadata"]["state"], json!("created"));
    assert!(wire["metadata"]["timestamp"].is_string());
}

#[tokio::test]
async fn hydrate_one_and_delete_unknown() {
    let mut service = service(&["b1"]);
    assert!(matches!(
        service.hydrate_one("b1").await,
        Err(IslandError::IslandNotFound { .. })
    ));
    assert!(matches!(
        service.delete("b1"),
        Err(IslandError::IslandNotFound { .. })
    ));
}
