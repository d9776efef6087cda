//! Adapter contract between the runtime and a rendering target.
//!
//! Each [`AdapterKind`] is served by one [`Adapter`]. The manager selects the
//! adapter by kind and never inspects the target any further; everything the
//! target needs to know lives behind `mount`/`hydrate`/`unmount`.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use archipelago_types::{AdapterKind, Props};

use crate::host::ContainerRef;
use crate::registry::ComponentFactory;

/// Adapter future type alias.
pub type AdapterFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Failure reported by an adapter, with the target's own error kept as source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Opaque handle to a mounted component instance.
///
/// Tagged with the kind of adapter that produced it. Downcasting requires the
/// same kind, so one adapter can never dereference another adapter's handle.
pub struct InstanceHandle {
    kind: AdapterKind,
    value: Box<dyn Any + Send + Sync>,
}

impl InstanceHandle {
    pub fn new<T: Any + Send + Sync>(kind: AdapterKind, value: T) -> Self {
        Self {
            kind,
            value: Box::new(value),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Borrow the adapter-owned value. `None` on kind or type mismatch.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self, kind: AdapterKind) -> Option<&T> {
        if self.kind != kind {
            return None;
        }
        self.value.downcast_ref::<T>()
    }

    /// Take ownership of the adapter-owned value, handing the handle back on mismatch.
    pub fn into_inner<T: Any>(self, kind: AdapterKind) -> Result<Box<T>, Self> {
        if self.kind != kind || !self.value.is::<T>() {
            return Err(self);
        }
        let Self { kind, value } = self;
        value.downcast::<T>().map_err(|value| Self { kind, value })
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Per-rendering-target implementation of the island lifecycle.
pub trait Adapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Create a live instance of `factory` inside `container`.
    ///
    /// Called at most once per descriptor lifetime. Mounting into a container
    /// that already holds another adapter's live instance is unsupported.
    fn mount<'a>(
        &'a self,
        factory: &'a ComponentFactory,
        container: &'a ContainerRef,
        props: &'a Props,
    ) -> AdapterFut<'a, InstanceHandle>;

    /// Attach interactivity to markup already present in `container`.
    ///
    /// The default is a no-op, for targets whose mount is already interactive.
    fn hydrate<'a>(
        &'a self,
        _instance: &'a InstanceHandle,
        _container: &'a ContainerRef,
        _props: &'a Props,
    ) -> AdapterFut<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    /// Release everything `mount` acquired.
    ///
    /// Must not panic. A returned error is logged by the caller and the
    /// teardown is still considered complete.
    fn unmount(&self, instance: InstanceHandle, container: &ContainerRef)
    -> Result<(), AdapterError>;
}

/// Kind → adapter table. Registering a kind twice replaces the earlier adapter.
#[derive(Default, Clone)]
pub struct AdapterSet {
    adapters: HashMap<AdapterKind, Arc<dyn Adapter>>,
}

impl AdapterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `adapter` for its kind, returning the adapter it replaced.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Option<Arc<dyn Adapter>> {
        let kind = adapter.kind();
        let previous = self.adapters.insert(kind, adapter);
        if previous.is_some() {
            tracing::debug!(kind = %kind, "Replaced island adapter");
        }
        previous
    }

    #[must_use]
    pub fn get(&self, kind: AdapterKind) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(&kind).cloned()
    }

    #[must_use]
    pub fn contains(&self, kind: AdapterKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    #[must_use]
    pub fn kinds(&self) -> Vec<AdapterKind> {
        let mut kinds: Vec<AdapterKind> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}
