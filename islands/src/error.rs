//! Error types for the island runtime.

use archipelago_types::{AdapterKind, IslandState};

use crate::adapter::AdapterError;

/// Errors surfaced by registry, manager and service operations.
///
/// Every failure is scoped to a single island; nothing here is fatal to the
/// runtime as a whole.
#[derive(Debug, thiserror::Error)]
pub enum IslandError {
    #[error("Component \"{name}\" not found in registry")]
    UnknownComponent { name: String },
    #[error("Component name must not be empty")]
    InvalidComponentName,
    #[error("Island id must not be empty")]
    InvalidIslandId,
    #[error("Container not found for island {id}: {container}")]
    ContainerNotFound { id: String, container: String },
    #[error("Island {id} is already active")]
    DuplicateIsland { id: String },
    #[error("Island with id {id} not found")]
    IslandNotFound { id: String },
    #[error("Framework adapter not found for: {kind}")]
    AdapterMissing { kind: AdapterKind },
    #[error("Cannot {operation} island {id} while {state}")]
    InvalidState {
        id: String,
        state: IslandState,
        operation: &'static str,
    },
    #[error("Failed to mount island {id}: {source}")]
    MountFailed {
        id: String,
        #[source]
        source: AdapterError,
    },
    #[error("Failed to hydrate island {id}: {source}")]
    HydrateFailed {
        id: String,
        #[source]
        source: AdapterError,
    },
    #[error("Malformed island payload: {0}")]
    Codec(#[from] serde_json::Error),
}

impl IslandError {
    /// Short machine-readable tag, stable across message wording changes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownComponent { .. } => "unknown_component",
            Self::InvalidComponentName => "invalid_component_name",
            Self::InvalidIslandId => "invalid_island_id",
            Self::ContainerNotFound { .. } => "container_not_found",
            Self::DuplicateIsland { .. } => "duplicate_island",
            Self::IslandNotFound { .. } => "island_not_found",
            Self::AdapterMissing { .. } => "adapter_missing",
            Self::InvalidState { .. } => "invalid_state",
            Self::MountFailed { .. } => "mount_failed",
            Self::HydrateFailed { .. } => "hydrate_failed",
            Self::Codec(_) => "codec",
        }
    }

    /// Whether the error came out of an adapter call rather than validation.
    #[must_use]
    pub fn is_adapter_failure(&self) -> bool {
        matches!(self, Self::MountFailed { .. } | Self::HydrateFailed { .. })
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self::IslandNotFound { id: id.to_string() }
    }
}

impl From<archipelago_types::EmptyIslandIdError> for IslandError {
    fn from(_: archipelago_types::EmptyIslandIdError) -> Self {
        Self::InvalidIslandId
    }
}
