//! Component registry: logical component name → factory and default policy.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use archipelago_types::{AdapterKind, Priority};

use crate::error::IslandError;

/// Opaque renderable reference handed to an adapter at mount time.
///
/// Only the adapter for the registration's kind knows the concrete type and
/// recovers it with [`ComponentFactory::downcast_ref`]. Clones share the same
/// underlying value.
#[derive(Clone)]
pub struct ComponentFactory(Arc<dyn Any + Send + Sync>);

impl ComponentFactory {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same factory value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentFactory(..)")
    }
}

/// Options accepted by [`ComponentRegistry::register`].
///
/// Unset fields fall back to SSR on, hydration on, priority `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    pub adapter_kind: AdapterKind,
    pub ssr: Option<bool>,
    pub hydrate: Option<bool>,
    pub priority: Option<Priority>,
}

impl RegisterOptions {
    #[must_use]
    pub fn new(adapter_kind: AdapterKind) -> Self {
        Self {
            adapter_kind,
            ssr: None,
            hydrate: None,
            priority: None,
        }
    }

    pub fn ssr(mut self, enabled: bool) -> Self {
        self.ssr = Some(enabled);
        self
    }

    pub fn hydrate(mut self, enabled: bool) -> Self {
        self.hydrate = Some(enabled);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// One registry entry.
#[derive(Debug, Clone)]
pub struct ComponentRegistration {
    name: String,
    adapter_kind: AdapterKind,
    factory: ComponentFactory,
    ssr_enabled: bool,
    hydrate_default: bool,
    priority_default: Priority,
}

impl ComponentRegistration {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn adapter_kind(&self) -> AdapterKind {
        self.adapter_kind
    }

    #[must_use]
    pub fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    #[must_use]
    pub fn ssr_enabled(&self) -> bool {
        self.ssr_enabled
    }

    #[must_use]
    pub fn hydrate_default(&self) -> bool {
        self.hydrate_default
    }

    #[must_use]
    pub fn priority_default(&self) -> Priority {
        self.priority_default
    }
}

// Factories compare by identity; there is no structural equality for them.
impl PartialEq for ComponentRegistration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.adapter_kind == other.adapter_kind
            && self.factory.ptr_eq(&other.factory)
            && self.ssr_enabled == other.ssr_enabled
            && self.hydrate_default == other.hydrate_default
            && self.priority_default == other.priority_default
    }
}

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: HashMap<String, ComponentRegistration>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a registration, replacing any previous entry of the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: ComponentFactory,
        options: RegisterOptions,
    ) -> Result<&ComponentRegistration, IslandError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IslandError::InvalidComponentName);
        }

        let registration = ComponentRegistration {
            name: name.clone(),
            adapter_kind: options.adapter_kind,
            factory,
            ssr_enabled: options.ssr.unwrap_or(true),
            hydrate_default: options.hydrate.unwrap_or(true),
            priority_default: options.priority.unwrap_or_default(),
        };
        tracing::debug!(
            component = %name,
            kind = %registration.adapter_kind,
            priority = %registration.priority_default,
            "Registered island component"
        );
        if self.entries.insert(name.clone(), registration).is_some() {
            tracing::debug!(component = %name, "Replaced previous registration");
        }
        self.resolve(&name)
    }

    /// Remove a registration. Absent names are ignored.
    pub fn unregister(&mut self, name: &str) -> Option<ComponentRegistration> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            tracing::debug!(component = %name, "Unregistered island component");
        }
        removed
    }

    pub fn resolve(&self, name: &str) -> Result<&ComponentRegistration, IslandError> {
        self.entries
            .get(name)
            .ok_or_else(|| IslandError::UnknownComponent {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
