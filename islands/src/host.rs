//! Placement environment where island containers live.
//!
//! The manager only asks the [`Host`] whether a container exists. Adapters
//! that render into memory (see [`crate::markup`]) also use [`MemoryHost`]
//! to read and write container contents.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use archipelago_types::{AdapterKind, IslandId};

/// Default container name prefix: island `b1` lives in container `island-b1`.
pub const DEFAULT_CONTAINER_PREFIX: &str = "island-";

/// Opaque handle to a placement target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerRef(String);

impl ContainerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Container name for `id` under the given prefix.
    #[must_use]
    pub fn for_island(prefix: &str, id: &IslandId) -> Self {
        Self(format!("{prefix}{id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host environment the manager places islands into.
pub trait Host: Send + Sync {
    fn has_container(&self, container: &ContainerRef) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("container {container} does not exist")]
    MissingContainer { container: String },
    #[error("container {container} is held by the {owner} adapter")]
    Occupied {
        container: String,
        owner: AdapterKind,
    },
}

/// Contents of one in-memory container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSlot {
    pub markup: String,
    pub interactive: bool,
    /// Adapter holding a live instance here, if any.
    pub owner: Option<AdapterKind>,
}

/// In-process host: a shared table of named containers.
///
/// Clones share the same table, so the manager and the adapters rendering
/// into it observe each other's changes.
#[derive(Clone, Default)]
pub struct MemoryHost {
    containers: Arc<Mutex<HashMap<ContainerRef, ContainerSlot>>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContainerRef, ContainerSlot>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an empty container. Returns false if it already existed.
    pub fn insert_container(&self, container: ContainerRef) -> bool {
        let mut containers = self.lock();
        if containers.contains_key(&container) {
            return false;
        }
        containers.insert(container, ContainerSlot::default());
        true
    }

    /// Add the conventional container for each island id.
    pub fn insert_island_containers<'a>(
        &self,
        prefix: &str,
        ids: impl IntoIterator<Item = &'a IslandId>,
    ) -> usize {
        ids.into_iter()
            .filter(|id| self.insert_container(ContainerRef::for_island(prefix, id)))
            .count()
    }

    pub fn remove_container(&self, container: &ContainerRef) -> Option<ContainerSlot> {
        self.lock().remove(container)
    }

    #[must_use]
    pub fn slot(&self, container: &ContainerRef) -> Option<ContainerSlot> {
        self.lock().get(container).cloned()
    }

    #[must_use]
    pub fn markup(&self, container: &ContainerRef) -> Option<String> {
        self.lock().get(container).map(|slot| slot.markup.clone())
    }

    #[must_use]
    pub fn is_interactive(&self, container: &ContainerRef) -> bool {
        self.lock()
            .get(container)
            .is_some_and(|slot| slot.interactive)
    }

    /// Write `markup` into `container` on behalf of `owner`.
    ///
    /// Refuses a container that holds another adapter's live instance.
    pub fn attach(
        &self,
        container: &ContainerRef,
        owner: AdapterKind,
        markup: String,
    ) -> Result<(), HostError> {
        let mut containers = self.lock();
        let slot = containers
            .get_mut(container)
            .ok_or_else(|| HostError::MissingContainer {
                container: container.to_string(),
            })?;
        if let Some(existing) = slot.owner
            && existing != owner
        {
            return Err(HostError::Occupied {
                container: container.to_string(),
                owner: existing,
            });
        }
        slot.markup = markup;
        slot.interactive = false;
        slot.owner = Some(owner);
        Ok(())
    }

    pub fn set_interactive(&self, container: &ContainerRef) -> Result<(), HostError> {
        let mut containers = self.lock();
        let slot = containers
            .get_mut(container)
            .ok_or_else(|| HostError::MissingContainer {
                container: container.to_string(),
            })?;
        slot.interactive = true;
        Ok(())
    }

    /// Clear the container's contents and release ownership.
    pub fn detach(&self, container: &ContainerRef) -> Result<(), HostError> {
        let mut containers = self.lock();
        let slot = containers
            .get_mut(container)
            .ok_or_else(|| HostError::MissingContainer {
                container: container.to_string(),
            })?;
        *slot = ContainerSlot::default();
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Host for MemoryHost {
    fn has_container(&self, container: &ContainerRef) -> bool {
        self.lock().contains_key(container)
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("containers", &self.len())
            .finish()
    }
}
