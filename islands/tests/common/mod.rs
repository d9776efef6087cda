//! Shared test utilities and fixtures
//!
//! A recording adapter plus a fixture that wires it into a manager over an
//! in-memory host.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use archipelago_islands::{
    Adapter, AdapterError, AdapterFut, AdapterKind, ComponentFactory, ContainerRef, CreateIsland,
    InstanceHandle, IslandId, IslandManager, MemoryHost, Priority, Props, RegisterOptions,
};

pub const PREFIX: &str = "island-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mount(String),
    Hydrate(String),
    Unmount(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

fn island_of(container: &ContainerRef) -> String {
    container
        .as_str()
        .strip_prefix(PREFIX)
        .unwrap_or(container.as_str())
        .to_string()
}

/// Adapter that records every call by island id and fails on request.
pub struct RecordingAdapter {
    kind: AdapterKind,
    log: CallLog,
    fail_mount: HashSet<String>,
    fail_hydrate: HashSet<String>,
    fail_unmount: bool,
}

impl RecordingAdapter {
    pub fn new(kind: AdapterKind, log: &CallLog) -> Self {
        Self {
            kind,
            log: Arc::clone(log),
            fail_mount: HashSet::new(),
            fail_hydrate: HashSet::new(),
            fail_unmount: false,
        }
    }

    pub fn failing_mount(mut self, island: &str) -> Self {
        self.fail_mount.insert(island.to_string());
        self
    }

    pub fn failing_hydrate(mut self, island: &str) -> Self {
        self.fail_hydrate.insert(island.to_string());
        self
    }

    pub fn failing_unmount(mut self) -> Self {
        self.fail_unmount = true;
        self
    }

    fn push(&self, call: Call) {
        self.log.lock().expect("log lock").push(call);
    }
}

impl Adapter for RecordingAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    fn mount<'a>(
        &'a self,
        _factory: &'a ComponentFactory,
        container: &'a ContainerRef,
        props: &'a Props,
    ) -> AdapterFut<'a, InstanceHandle> {
        Box::pin(async move {
            let island = island_of(container);
            self.push(Call::Mount(island.clone()));
            if self.fail_mount.contains(&island) {
                return Err(AdapterError::new(format!("cannot mount {island}")));
            }
            Ok(InstanceHandle::new(self.kind, props.clone()))
        })
    }

    fn hydrate<'a>(
        &'a self,
        instance: &'a InstanceHandle,
        container: &'a ContainerRef,
        _props: &'a Props,
    ) -> AdapterFut<'a, ()> {
        Box::pin(async move {
            let island = island_of(container);
            self.push(Call::Hydrate(island.clone()));
            if instance.downcast_ref::<Props>(self.kind).is_none() {
                return Err(AdapterError::new("foreign instance"));
            }
            if self.fail_hydrate.contains(&island) {
                return Err(AdapterError::new(format!("cannot hydrate {island}")));
            }
            Ok(())
        })
    }

    fn unmount(
        &self,
        _instance: InstanceHandle,
        container: &ContainerRef,
    ) -> Result<(), AdapterError> {
        self.push(Call::Unmount(island_of(container)));
        if self.fail_unmount {
            return Err(AdapterError::new("teardown failed"));
        }
        Ok(())
    }
}

pub fn id(raw: &str) -> IslandId {
    IslandId::new(raw).expect("valid island id")
}

pub fn props(value: serde_json::Value) -> Props {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("props must be a JSON object, got {other}"),
    }
}

/// Manager over a memory host with one recording adapter installed.
pub struct Fixture {
    pub manager: IslandManager,
    pub host: MemoryHost,
    pub log: CallLog,
    kind: AdapterKind,
}

impl Fixture {
    pub fn new(kind: AdapterKind) -> Self {
        Self::with_adapter(kind, |adapter| adapter)
    }

    pub fn with_adapter(
        kind: AdapterKind,
        configure: impl FnOnce(RecordingAdapter) -> RecordingAdapter,
    ) -> Self {
        let log = CallLog::default();
        let host = MemoryHost::new();
        let mut manager = IslandManager::new(host.clone());
        manager.register_adapter(Arc::new(configure(RecordingAdapter::new(kind, &log))));
        Self {
            manager,
            host,
            log,
            kind,
        }
    }

    pub fn register(&mut self, name: &str, priority: Option<Priority>) {
        let mut options = RegisterOptions::new(self.kind);
        options.priority = priority;
        self.manager
            .register(name, ComponentFactory::new(name.to_string()), options)
            .expect("register component");
    }

    pub fn add_container(&self, raw: &str) {
        self.host
            .insert_container(ContainerRef::for_island(PREFIX, &id(raw)));
    }

    /// Create an island with its container, keeping registration defaults.
    pub fn place(&mut self, raw: &str, component: &str) {
        self.add_container(raw);
        self.manager
            .create_island(CreateIsland::new(id(raw), component))
            .expect("create island");
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn hydrated(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Hydrate(island) => Some(island),
                _ => None,
            })
            .collect()
    }
}
