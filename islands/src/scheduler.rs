//! Hydration scheduler: drives a batch of islands to interactivity.
//!
//! Islands are ordered by priority tier (`high` first, ties in insertion
//! order) and processed one at a time: pending islands are mounted, then
//! hydrated. A failing island is recorded and the batch moves on.

use std::cmp::Reverse;
use std::fmt;

use archipelago_types::{IslandId, IslandState, Priority};

use crate::error::IslandError;
use crate::manager::IslandManager;

/// One island that did not make it through the batch.
#[derive(Debug)]
pub struct HydrationFailure {
    pub id: String,
    pub error: IslandError,
}

/// Outcome of one scheduler batch. Id lists are in processing order.
#[derive(Debug, Default)]
pub struct HydrationReport {
    pub mounted: Vec<IslandId>,
    pub hydrated: Vec<IslandId>,
    /// Already hydrated, or mounted with hydration off.
    pub skipped: Vec<IslandId>,
    pub failures: Vec<HydrationFailure>,
}

impl HydrationReport {
    #[must_use]
    pub fn hydrated_count(&self) -> usize {
        self.hydrated.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub type FailureHook = Box<dyn FnMut(&HydrationFailure) + Send>;
pub type CompletionHook = Box<dyn FnMut(&HydrationReport) + Send>;

#[derive(Default)]
pub struct HydrationScheduler {
    on_error: Option<FailureHook>,
    on_complete: Option<CompletionHook>,
}

impl HydrationScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called as each failure happens, before the next island starts.
    #[must_use]
    pub fn on_error(mut self, hook: impl FnMut(&HydrationFailure) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Called once with the full report after the batch.
    #[must_use]
    pub fn on_complete(mut self, hook: impl FnMut(&HydrationReport) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Run every island that is not `Unmounted`.
    pub async fn run_all(&mut self, manager: &mut IslandManager) -> HydrationReport {
        let ids: Vec<IslandId> = manager
            .islands()
            .filter(|island| island.state() != IslandState::Unmounted)
            .map(|island| island.id().clone())
            .collect();
        self.run(manager, ids).await
    }

    /// Mount and hydrate the given islands in priority order.
    pub async fn run(
        &mut self,
        manager: &mut IslandManager,
        ids: impl IntoIterator<Item = IslandId>,
    ) -> HydrationReport {
        let mut report = HydrationReport::default();

        let mut plan: Vec<(IslandId, Priority)> = Vec::new();
        for id in ids {
            match manager.island(id.as_str()) {
                Some(island) => plan.push((id, island.priority())),
                None => {
                    let error = IslandError::IslandNotFound { id: id.to_string() };
                    self.record(&mut report, id, error);
                }
            }
        }
        plan.sort_by_key(|(_, priority)| Reverse(*priority));
        tracing::debug!(
            batch = plan.len(),
            order = ?plan.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            "Hydration plan ready"
        );

        for (id, _) in plan {
            self.step(manager, id, &mut report).await;
        }

        tracing::info!(
            hydrated = report.hydrated.len(),
            mounted = report.mounted.len(),
            failed = report.failures.len(),
            "Hydration batch complete"
        );
        if let Some(hook) = self.on_complete.as_mut() {
            hook(&report);
        }
        report
    }

    async fn step(
        &mut self,
        manager: &mut IslandManager,
        id: IslandId,
        report: &mut HydrationReport,
    ) {
        let Some(island) = manager.island(id.as_str()) else {
            let error = IslandError::IslandNotFound { id: id.to_string() };
            self.record(report, id, error);
            return;
        };
        let state = island.state();
        let hydrate = island.hydrate();

        if state == IslandState::Hydrated || (state == IslandState::Mounted && !hydrate) {
            tracing::debug!(island = %id, state = %state, "Nothing to do; skipping");
            report.skipped.push(id);
            return;
        }

        if state.can_mount() {
            if let Err(error) = manager.mount_island(id.as_str()).await {
                self.record(report, id, error);
                return;
            }
            report.mounted.push(id.clone());
            if !hydrate {
                return;
            }
        }

        match manager.hydrate_island(id.as_str()).await {
            Ok(()) => report.hydrated.push(id),
            Err(error) => self.record(report, id, error),
        }
    }

    fn record(&mut self, report: &mut HydrationReport, id: IslandId, error: IslandError) {
        tracing::warn!(island = %id, error = %error, "Island failed during hydration batch");
        let failure = HydrationFailure {
            id: id.into_inner(),
            error,
        };
        if let Some(hook) = self.on_error.as_mut() {
            hook(&failure);
        }
        report.failures.push(failure);
    }
}

impl fmt::Debug for HydrationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationScheduler")
            .field("on_error", &self.on_error.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
