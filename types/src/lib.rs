//! Core domain types for Archipelago islands.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be shared by the runtime, the configuration layer, and callers.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
pub use ids::{EmptyIslandIdError, IslandId};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Island props: an insertion-ordered JSON object.
pub type Props = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Priority
// ============================================================================

/// Hydration priority tier.
///
/// Variants are declared lowest first so the derived `Ord` gives
/// `High > Normal > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Rendering targets
// ============================================================================

/// Rendering target an island's component belongs to.
///
/// Each kind is served by exactly one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    React,
    Vue,
    Angular,
    Svelte,
    Vanilla,
}

impl AdapterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Angular => "angular",
            Self::Svelte => "svelte",
            Self::Vanilla => "vanilla",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle tag of an island descriptor.
///
/// There is no terminal state: `Unmounted` islands may be mounted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IslandState {
    Created,
    Mounted,
    Hydrated,
    Unmounted,
}

impl IslandState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Mounted => "mounted",
            Self::Hydrated => "hydrated",
            Self::Unmounted => "unmounted",
        }
    }

    /// Whether an adapter instance is live in this state.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Mounted | Self::Hydrated)
    }

    /// Whether `mount` may be issued from this state.
    #[must_use]
    pub const fn can_mount(self) -> bool {
        matches!(self, Self::Created | Self::Unmounted)
    }
}

impl fmt::Display for IslandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
