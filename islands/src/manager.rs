//! Island manager: the control surface callers use.
//!
//! The manager owns the component registry, the adapter table and every
//! island descriptor. Islands live in an insertion-ordered table keyed by id;
//! an `Unmounted` entry no longer counts as active and its id may be reused.
//!
//! Adapter dispatch happens in exactly three places (`mount_island`,
//! `hydrate_island`, `unmount_island`) and only by [`AdapterKind`].

use std::sync::Arc;

use archipelago_types::{IslandId, IslandState, Priority};
use indexmap::IndexMap;
use serde::Serialize;

use crate::adapter::{Adapter, AdapterError, AdapterSet};
use crate::descriptor::{
    CreateIsland, IslandDescriptor, IslandUpdate, TransportIsland, TransportPayload,
};
use crate::error::IslandError;
use crate::host::{ContainerRef, DEFAULT_CONTAINER_PREFIX, Host};
use crate::registry::{ComponentFactory, ComponentRegistration, ComponentRegistry, RegisterOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Prefix joined with the island id to name its container.
    pub container_prefix: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            container_prefix: DEFAULT_CONTAINER_PREFIX.to_string(),
        }
    }
}

/// Island counts per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IslandStats {
    pub total: usize,
    pub created: usize,
    pub mounted: usize,
    pub hydrated: usize,
    pub unmounted: usize,
    /// Islands whose last operation failed.
    pub errored: usize,
}

pub struct IslandManager {
    registry: ComponentRegistry,
    adapters: AdapterSet,
    host: Arc<dyn Host>,
    islands: IndexMap<IslandId, IslandDescriptor>,
    settings: ManagerSettings,
}

impl IslandManager {
    pub fn new(host: impl Host + 'static) -> Self {
        Self::with_settings(host, ManagerSettings::default())
    }

    pub fn with_settings(host: impl Host + 'static, settings: ManagerSettings) -> Self {
        Self {
            registry: ComponentRegistry::new(),
            adapters: AdapterSet::new(),
            host: Arc::new(host),
            islands: IndexMap::new(),
            settings,
        }
    }

    // ── Adapters & registry ───────────────────────────────────────

    /// Install the adapter for its kind, replacing any earlier one.
    pub fn register_adapter(&mut self, adapter: Arc<dyn Adapter>) {
        let kind = adapter.kind();
        self.adapters.register(adapter);
        tracing::debug!(kind = %kind, "Island adapter installed");
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: ComponentFactory,
        options: RegisterOptions,
    ) -> Result<&ComponentRegistration, IslandError> {
        self.registry.register(name, factory, options)
    }

    pub fn unregister(&mut self, name: &str) -> Option<ComponentRegistration> {
        self.registry.unregister(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&ComponentRegistration, IslandError> {
        self.registry.resolve(name)
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // ── Descriptor table ──────────────────────────────────────────

    #[must_use]
    pub fn container_for(&self, id: &IslandId) -> ContainerRef {
        ContainerRef::for_island(&self.settings.container_prefix, id)
    }

    #[must_use]
    pub fn island(&self, id: &str) -> Option<&IslandDescriptor> {
        self.islands.get(id)
    }

    /// All islands, in insertion order.
    pub fn islands(&self) -> impl Iterator<Item = &IslandDescriptor> {
        self.islands.values()
    }

    #[must_use]
    pub fn islands_by_priority(&self, priority: Priority) -> Vec<&IslandDescriptor> {
        self.islands
            .values()
            .filter(|island| island.priority() == priority)
            .collect()
    }

    /// Ids of islands that still need a mount or a hydrate, in insertion order.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<IslandId> {
        self.islands
            .values()
            .filter(|island| island.is_pending())
            .map(|island| island.id().clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> IslandStats {
        let mut stats = IslandStats {
            total: self.islands.len(),
            ..IslandStats::default()
        };
        for island in self.islands.values() {
            match island.state() {
                IslandState::Created => stats.created += 1,
                IslandState::Mounted => stats.mounted += 1,
                IslandState::Hydrated => stats.hydrated += 1,
                IslandState::Unmounted => stats.unmounted += 1,
            }
            if island.is_errored() {
                stats.errored += 1;
            }
        }
        stats
    }

    fn get(&self, id: &str) -> Result<&IslandDescriptor, IslandError> {
        self.islands.get(id).ok_or_else(|| IslandError::not_found(id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut IslandDescriptor, IslandError> {
        self.islands
            .get_mut(id)
            .ok_or_else(|| IslandError::not_found(id))
    }

    /// An id is taken while its island is anything but `Unmounted`.
    fn ensure_available(&self, id: &IslandId) -> Result<(), IslandError> {
        match self.islands.get(id) {
            Some(existing) if existing.state() != IslandState::Unmounted => {
                Err(IslandError::DuplicateIsland { id: id.to_string() })
            }
            _ => Ok(()),
        }
    }

    fn ensure_container(&self, id: &IslandId) -> Result<ContainerRef, IslandError> {
        let container = self.container_for(id);
        if self.host.has_container(&container) {
            Ok(container)
        } else {
            Err(IslandError::ContainerNotFound {
                id: id.to_string(),
                container: container.to_string(),
            })
        }
    }

    /// Insert at the end of the table, replacing a reusable `Unmounted` entry.
    fn adopt(&mut self, descriptor: IslandDescriptor) -> &IslandDescriptor {
        let id = descriptor.id().clone();
        self.islands.shift_remove(&id);
        let (index, _) = self.islands.insert_full(id, descriptor);
        &self.islands[index]
    }

    /// Attach the advisory error marker and hand the error back.
    fn fail(&mut self, id: &str, err: IslandError) -> IslandError {
        tracing::warn!(island = %id, error = %err, "Island operation failed");
        if let Some(island) = self.islands.get_mut(id) {
            island.mark_errored(err.to_string());
        }
        err
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Check that [`Self::create_island`] would accept `request`, without
    /// touching the table.
    pub fn check_create(&self, request: &CreateIsland) -> Result<(), IslandError> {
        self.registry.resolve(&request.component)?;
        self.ensure_available(&request.id)?;
        self.ensure_container(&request.id)?;
        Ok(())
    }

    /// Build a descriptor in state `Created` and track it under its id.
    pub fn create_island(&mut self, request: CreateIsland) -> Result<&IslandDescriptor, IslandError> {
        let registration = self.registry.resolve(&request.component)?;
        let hydrate = request.hydrate.unwrap_or(registration.hydrate_default());
        let priority = request
            .priority
            .unwrap_or(registration.priority_default());
        let kind = registration.adapter_kind();

        self.ensure_available(&request.id)?;
        let container = self.ensure_container(&request.id)?;

        tracing::info!(
            island = %request.id,
            component = %request.component,
            kind = %kind,
            priority = %priority,
            "Island created"
        );
        let descriptor = IslandDescriptor::new(
            request.id,
            request.component,
            request.props,
            hydrate,
            priority,
            kind,
            container,
        );
        Ok(self.adopt(descriptor))
    }

    /// Mount a `Created` or `Unmounted` island through its adapter.
    ///
    /// On failure the island keeps its previous state; only the error
    /// marker changes.
    pub async fn mount_island(&mut self, id: &str) -> Result<(), IslandError> {
        let descriptor = self.get(id)?;
        let state = descriptor.state();
        if !state.can_mount() {
            return Err(IslandError::InvalidState {
                id: id.to_string(),
                state,
                operation: "mount",
            });
        }

        // Nothing is live, so the registration's current kind applies.
        let resolved = self
            .registry
            .resolve(descriptor.component())
            .map(|reg| (reg.factory().clone(), reg.adapter_kind()));
        let (factory, kind) = match resolved {
            Ok(found) => found,
            Err(err) => return Err(self.fail(id, err)),
        };
        let Some(adapter) = self.adapters.get(kind) else {
            return Err(self.fail(id, IslandError::AdapterMissing { kind }));
        };

        let outcome = {
            let descriptor = self.get(id)?;
            adapter
                .mount(&factory, descriptor.container(), descriptor.props())
                .await
        };

        match outcome {
            Ok(instance) => {
                let descriptor = self.get_mut(id)?;
                if descriptor.adapter_kind() != kind {
                    tracing::debug!(
                        island = %id,
                        from = %descriptor.adapter_kind(),
                        to = %kind,
                        "Island follows re-registered adapter kind"
                    );
                    descriptor.set_adapter_kind(kind);
                }
                descriptor.mark_mounted(instance);
                tracing::info!(island = %id, kind = %kind, "Island mounted");
                Ok(())
            }
            Err(source) => Err(self.fail(
                id,
                IslandError::MountFailed {
                    id: id.to_string(),
                    source,
                },
            )),
        }
    }

    /// Hydrate a `Mounted` island.
    ///
    /// Succeeds immediately for islands with hydration off and for islands
    /// already hydrated. A failed hydrate leaves the island `Mounted`.
    pub async fn hydrate_island(&mut self, id: &str) -> Result<(), IslandError> {
        let descriptor = self.get(id)?;
        if !descriptor.hydrate() {
            return Ok(());
        }
        match descriptor.state() {
            IslandState::Mounted => {}
            IslandState::Hydrated => return Ok(()),
            state => {
                return Err(IslandError::InvalidState {
                    id: id.to_string(),
                    state,
                    operation: "hydrate",
                });
            }
        }

        let kind = descriptor.adapter_kind();
        let Some(adapter) = self.adapters.get(kind) else {
            return Err(self.fail(id, IslandError::AdapterMissing { kind }));
        };

        let outcome = {
            let descriptor = self.get(id)?;
            match descriptor.instance() {
                Some(instance) => {
                    adapter
                        .hydrate(instance, descriptor.container(), descriptor.props())
                        .await
                }
                None => Err(AdapterError::new("island has no live instance")),
            }
        };

        match outcome {
            Ok(()) => {
                self.get_mut(id)?.mark_hydrated();
                tracing::info!(island = %id, kind = %kind, "Island hydrated");
                Ok(())
            }
            Err(source) => Err(self.fail(
                id,
                IslandError::HydrateFailed {
                    id: id.to_string(),
                    source,
                },
            )),
        }
    }

    /// Tear down a live island. Always completes.
    ///
    /// `Created` and `Unmounted` islands are left alone. Adapter teardown
    /// errors are logged and swallowed; the island ends up `Unmounted` and
    /// its id becomes reusable.
    pub fn unmount_island(&mut self, id: &str) -> Result<(), IslandError> {
        let descriptor = self.get_mut(id)?;
        if !descriptor.state().is_live() {
            return Ok(());
        }
        let container = descriptor.container().clone();
        let instance = descriptor.take_instance();
        descriptor.mark_unmounted();

        if let Some(instance) = instance {
            let kind = instance.kind();
            match self.adapters.get(kind) {
                Some(adapter) => {
                    if let Err(e) = adapter.unmount(instance, &container) {
                        tracing::warn!(
                            island = %id,
                            kind = %kind,
                            error = %e,
                            "Adapter teardown failed; island unmounted anyway"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        island = %id,
                        kind = %kind,
                        "No adapter for live instance; dropping it"
                    );
                }
            }
        }
        tracing::info!(island = %id, "Island unmounted");
        Ok(())
    }

    /// Unmount every live island. Returns how many were torn down.
    pub fn unmount_all(&mut self) -> usize {
        let live: Vec<IslandId> = self
            .islands
            .values()
            .filter(|island| island.state().is_live())
            .map(|island| island.id().clone())
            .collect();
        for id in &live {
            if let Err(err) = self.unmount_island(id.as_str()) {
                tracing::warn!(island = %id, error = %err, "Failed to unmount island");
            }
        }
        live.len()
    }

    /// Unmount (if needed) and forget an island.
    pub fn remove_island(&mut self, id: &str) -> Result<IslandDescriptor, IslandError> {
        self.unmount_island(id)?;
        let removed = self
            .islands
            .shift_remove(id)
            .ok_or_else(|| IslandError::not_found(id))?;
        tracing::debug!(island = %id, "Island removed");
        Ok(removed)
    }

    /// Patch props, hydrate flag or priority of an island that is not live.
    pub fn update_island(
        &mut self,
        id: &str,
        update: IslandUpdate,
    ) -> Result<&IslandDescriptor, IslandError> {
        let descriptor = self.get_mut(id)?;
        let state = descriptor.state();
        if !state.can_mount() {
            return Err(IslandError::InvalidState {
                id: id.to_string(),
                state,
                operation: "update",
            });
        }
        descriptor.apply(update);
        tracing::debug!(island = %id, "Island updated");
        Ok(descriptor)
    }

    // ── Transport ─────────────────────────────────────────────────

    /// Encode the transportable identity of an island as JSON.
    pub fn serialize_island(&self, id: &str) -> Result<String, IslandError> {
        self.get(id)?.transport().to_json()
    }

    /// Decode a serialized island into a fresh `Created` descriptor.
    ///
    /// The result is not tracked by the manager; see [`Self::resume_island`].
    pub fn deserialize_island(&self, data: &str) -> Result<IslandDescriptor, IslandError> {
        let transport = TransportIsland::from_json(data)?;
        let container = self.container_for(&transport.id);
        Ok(IslandDescriptor::from_transport(transport, container))
    }

    /// Decode a serialized island and track it, validating like `create_island`.
    ///
    /// Absent `hydrate` and `priority` take the registration's defaults.
    pub fn resume_island(&mut self, data: &str) -> Result<&IslandDescriptor, IslandError> {
        let payload = TransportPayload::from_json(data)?;
        let registration = self.registry.resolve(&payload.component)?;
        let kind = registration.adapter_kind();
        let transport =
            payload.complete(registration.hydrate_default(), registration.priority_default());
        if kind != transport.adapter_kind {
            tracing::warn!(
                island = %transport.id,
                payload = %transport.adapter_kind,
                registered = %kind,
                "Serialized adapter kind differs from registration; using registration"
            );
        }
        self.ensure_available(&transport.id)?;
        let container = self.ensure_container(&transport.id)?;

        let mut descriptor = IslandDescriptor::from_transport(transport, container);
        descriptor.set_adapter_kind(kind);
        tracing::info!(island = %descriptor.id(), "Island resumed from payload");
        Ok(self.adopt(descriptor))
    }
}

impl std::fmt::Debug for IslandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IslandManager")
            .field("registry", &self.registry)
            .field("adapters", &self.adapters)
            .field("islands", &self.islands.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
