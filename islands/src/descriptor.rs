//! Island descriptor: the record of one placeable island and its lifecycle.

use archipelago_types::{AdapterKind, IslandId, IslandState, Priority, Props};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::InstanceHandle;
use crate::error::IslandError;
use crate::host::ContainerRef;

/// Arguments to [`crate::IslandManager::create_island`].
///
/// `hydrate` and `priority` fall back to the registration's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIsland {
    pub id: IslandId,
    pub component: String,
    pub props: Props,
    pub hydrate: Option<bool>,
    pub priority: Option<Priority>,
}

impl CreateIsland {
    pub fn new(id: IslandId, component: impl Into<String>) -> Self {
        Self {
            id,
            component: component.into(),
            props: Props::new(),
            hydrate: None,
            priority: None,
        }
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = Some(hydrate);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Partial update of an island that is not currently mounted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IslandUpdate {
    #[serde(default)]
    pub props: Option<Props>,
    #[serde(default)]
    pub hydrate: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Transportable identity of an island (the SSR resume payload).
///
/// Excludes the container and the adapter instance, which only mean
/// something inside the process that created them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportIsland {
    pub id: IslandId,
    pub component: String,
    pub props: Props,
    pub hydrate: bool,
    pub priority: Priority,
    #[serde(rename = "framework")]
    pub adapter_kind: AdapterKind,
}

impl TransportIsland {
    pub fn to_json(&self) -> Result<String, IslandError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a payload, filling absent `hydrate` and `priority` with the
    /// global defaults (on, `normal`).
    pub fn from_json(data: &str) -> Result<Self, IslandError> {
        Ok(TransportPayload::from_json(data)?.complete(true, Priority::default()))
    }
}

/// A payload as received: `hydrate` and `priority` may be left out.
#[derive(Debug, Deserialize)]
pub(crate) struct TransportPayload {
    pub(crate) id: IslandId,
    pub(crate) component: String,
    #[serde(default)]
    props: Props,
    #[serde(default)]
    hydrate: Option<bool>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(rename = "framework")]
    pub(crate) adapter_kind: AdapterKind,
}

impl TransportPayload {
    pub(crate) fn from_json(data: &str) -> Result<Self, IslandError> {
        Ok(serde_json::from_str(data)?)
    }

    pub(crate) fn complete(self, hydrate: bool, priority: Priority) -> TransportIsland {
        TransportIsland {
            id: self.id,
            component: self.component,
            props: self.props,
            hydrate: self.hydrate.unwrap_or(hydrate),
            priority: self.priority.unwrap_or(priority),
            adapter_kind: self.adapter_kind,
        }
    }
}

#[derive(Debug)]
pub struct IslandDescriptor {
    id: IslandId,
    component: String,
    props: Props,
    hydrate: bool,
    priority: Priority,
    adapter_kind: AdapterKind,
    container: ContainerRef,
    instance: Option<InstanceHandle>,
    state: IslandState,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
}

impl IslandDescriptor {
    pub(crate) fn new(
        id: IslandId,
        component: String,
        props: Props,
        hydrate: bool,
        priority: Priority,
        adapter_kind: AdapterKind,
        container: ContainerRef,
    ) -> Self {
        Self {
            id,
            component,
            props,
            hydrate,
            priority,
            adapter_kind,
            container,
            instance: None,
            state: IslandState::Created,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn from_transport(transport: TransportIsland, container: ContainerRef) -> Self {
        Self::new(
            transport.id,
            transport.component,
            transport.props,
            transport.hydrate,
            transport.priority,
            transport.adapter_kind,
            container,
        )
    }

    #[must_use]
    pub fn id(&self) -> &IslandId {
        &self.id
    }

    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    #[must_use]
    pub fn hydrate(&self) -> bool {
        self.hydrate
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn adapter_kind(&self) -> AdapterKind {
        self.adapter_kind
    }

    #[must_use]
    pub fn container(&self) -> &ContainerRef {
        &self.container
    }

    #[must_use]
    pub fn state(&self) -> IslandState {
        self.state
    }

    #[must_use]
    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    /// Message of the last failed operation, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn is_errored(&self) -> bool {
        self.last_error.is_some()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the scheduler still has work to do for this island.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match self.state {
            IslandState::Created | IslandState::Unmounted => true,
            IslandState::Mounted => self.hydrate,
            IslandState::Hydrated => false,
        }
    }

    #[must_use]
    pub fn transport(&self) -> TransportIsland {
        TransportIsland {
            id: self.id.clone(),
            component: self.component.clone(),
            props: self.props.clone(),
            hydrate: self.hydrate,
            priority: self.priority,
            adapter_kind: self.adapter_kind,
        }
    }

    // ── Lifecycle mutation, manager only ──────────────────────────

    pub(crate) fn instance(&self) -> Option<&InstanceHandle> {
        self.instance.as_ref()
    }

    pub(crate) fn set_adapter_kind(&mut self, kind: AdapterKind) {
        self.adapter_kind = kind;
    }

    pub(crate) fn mark_mounted(&mut self, instance: InstanceHandle) {
        self.instance = Some(instance);
        self.state = IslandState::Mounted;
        self.last_error = None;
    }

    pub(crate) fn mark_hydrated(&mut self) {
        self.state = IslandState::Hydrated;
        self.last_error = None;
    }

    pub(crate) fn take_instance(&mut self) -> Option<InstanceHandle> {
        self.instance.take()
    }

    pub(crate) fn mark_unmounted(&mut self) {
        self.instance = None;
        self.state = IslandState::Unmounted;
        self.last_error = None;
    }

    pub(crate) fn mark_errored(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub(crate) fn apply(&mut self, update: IslandUpdate) {
        if let Some(props) = update.props {
            self.props = props;
        }
        if let Some(hydrate) = update.hydrate {
            self.hydrate = hydrate;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
    }
}
