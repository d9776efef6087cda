//! Island lifecycle runtime.
//!
//! Independently interactive regions ("islands") of a server-rendered page
//! are registered, placed, mounted, hydrated and torn down through an
//! [`IslandManager`]. Rendering targets plug in behind the [`Adapter`] trait;
//! [`HydrationScheduler`] drives batches in priority order.

pub mod adapter;
pub mod host;
pub mod markup;

mod descriptor;
mod error;
mod manager;
mod registry;
mod scheduler;
mod service;

pub use adapter::{Adapter, AdapterError, AdapterFut, AdapterSet, InstanceHandle};
pub use archipelago_types::{AdapterKind, IslandId, IslandState, Priority, Props};
pub use descriptor::{CreateIsland, IslandDescriptor, IslandUpdate, TransportIsland};
pub use error::IslandError;
pub use host::{ContainerRef, Host, MemoryHost};
pub use manager::{IslandManager, IslandStats, ManagerSettings};
pub use markup::{MarkupAdapter, MarkupComponent};
pub use registry::{ComponentFactory, ComponentRegistration, ComponentRegistry, RegisterOptions};
pub use scheduler::{
    CompletionHook, FailureHook, HydrationFailure, HydrationReport, HydrationScheduler,
};
pub use service::{
    BatchSummary, FailureSummary, HydrationSummary, IslandMetadata, IslandRequest, IslandService,
    IslandSummary,
};
