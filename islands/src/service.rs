//! Request/response surface over the manager and scheduler.
//!
//! Requests and summaries are plain serde values so a transport layer can
//! expose them directly.

use std::collections::{HashMap, HashSet};

use archipelago_types::{IslandId, IslandState, Priority, Props};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::descriptor::{CreateIsland, IslandDescriptor, IslandUpdate};
use crate::error::IslandError;
use crate::manager::{IslandManager, IslandStats};
use crate::markup::placement_markup;
use crate::registry::ComponentRegistration;
use crate::scheduler::{HydrationReport, HydrationScheduler};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandRequest {
    pub id: String,
    pub component: String,
    #[serde(default)]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydrate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssr: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandMetadata {
    pub component: String,
    pub hydrate: bool,
    pub priority: Priority,
    pub ssr: bool,
    pub state: IslandState,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandSummary {
    pub id: String,
    pub html: String,
    pub props: Props,
    pub metadata: IslandMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub islands: Vec<IslandSummary>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub id: String,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationSummary {
    pub hydrated_count: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureSummary>,
}

impl From<&HydrationReport> for HydrationSummary {
    fn from(report: &HydrationReport) -> Self {
        Self {
            hydrated_count: report.hydrated_count(),
            message: format!("{} islands hydrated successfully", report.hydrated_count()),
            failures: report
                .failures
                .iter()
                .map(|failure| FailureSummary {
                    id: failure.id.clone(),
                    kind: failure.error.kind(),
                    message: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct IslandService {
    manager: IslandManager,
    scheduler: HydrationScheduler,
    /// Per-island SSR overrides from create requests.
    ssr: HashMap<IslandId, bool>,
}

impl IslandService {
    #[must_use]
    pub fn new(manager: IslandManager) -> Self {
        Self::with_scheduler(manager, HydrationScheduler::new())
    }

    #[must_use]
    pub fn with_scheduler(manager: IslandManager, scheduler: HydrationScheduler) -> Self {
        Self {
            manager,
            scheduler,
            ssr: HashMap::new(),
        }
    }

    #[must_use]
    pub fn manager(&self) -> &IslandManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut IslandManager {
        &mut self.manager
    }

    fn summarize(&self, island: &IslandDescriptor) -> IslandSummary {
        let ssr = self
            .ssr
            .get(island.id())
            .copied()
            .or_else(|| {
                self.manager
                    .resolve(island.component())
                    .ok()
                    .map(ComponentRegistration::ssr_enabled)
            })
            .unwrap_or(true);
        IslandSummary {
            id: island.id().to_string(),
            html: placement_markup(island.container(), island.id(), island.component()),
            props: island.props().clone(),
            metadata: IslandMetadata {
                component: island.component().to_string(),
                hydrate: island.hydrate(),
                priority: island.priority(),
                ssr,
                state: island.state(),
                timestamp: island
                    .created_at()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        }
    }

    fn plan(request: IslandRequest) -> Result<(CreateIsland, Option<bool>), IslandError> {
        let id = IslandId::new(request.id)?;
        let mut create = CreateIsland::new(id, request.component).props(request.props);
        create.hydrate = request.hydrate;
        create.priority = request.priority;
        Ok((create, request.ssr))
    }

    fn insert(&mut self, create: CreateIsland, ssr: Option<bool>) -> Result<IslandId, IslandError> {
        let id = create.id.clone();
        self.manager.create_island(create)?;
        match ssr {
            Some(ssr) => self.ssr.insert(id.clone(), ssr),
            None => self.ssr.remove(&id),
        };
        Ok(id)
    }

    pub fn create(&mut self, request: IslandRequest) -> Result<IslandSummary, IslandError> {
        let (create, ssr) = Self::plan(request)?;
        let id = self.insert(create, ssr)?;
        self.get(id.as_str())
    }

    /// Create every island or none.
    ///
    /// The whole batch is checked before anything is created, so a rejected
    /// batch leaves existing islands (including reusable `Unmounted` ones)
    /// untouched.
    pub fn create_batch(
        &mut self,
        requests: Vec<IslandRequest>,
    ) -> Result<BatchSummary, IslandError> {
        let mut planned = Vec::with_capacity(requests.len());
        let mut seen = HashSet::new();
        for request in requests {
            let (create, ssr) = Self::plan(request)?;
            if !seen.insert(create.id.clone()) {
                return Err(IslandError::DuplicateIsland {
                    id: create.id.to_string(),
                });
            }
            if let Err(err) = self.manager.check_create(&create) {
                tracing::warn!(island = %create.id, error = %err, "Batch rejected");
                return Err(err);
            }
            planned.push((create, ssr));
        }

        let mut created = Vec::with_capacity(planned.len());
        for (create, ssr) in planned {
            match self.insert(create, ssr) {
                Ok(id) => created.push(id),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        rolled_back = created.len(),
                        "Batch create failed; rolling back"
                    );
                    for id in &created {
                        if let Err(err) = self.delete(id.as_str()) {
                            tracing::warn!(island = %id, error = %err, "Rollback failed");
                        }
                    }
                    return Err(err);
                }
            }
        }

        let islands = created
            .iter()
            .map(|id| self.get(id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchSummary {
            message: format!("{} islands created successfully", islands.len()),
            islands,
        })
    }

    pub fn get(&self, id: &str) -> Result<IslandSummary, IslandError> {
        self.manager
            .island(id)
            .map(|island| self.summarize(island))
            .ok_or_else(|| IslandError::not_found(id))
    }

    #[must_use]
    pub fn list(&self) -> Vec<IslandSummary> {
        self.manager
            .islands()
            .map(|island| self.summarize(island))
            .collect()
    }

    pub fn update(&mut self, id: &str, update: IslandUpdate) -> Result<IslandSummary, IslandError> {
        self.manager.update_island(id, update)?;
        self.get(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), IslandError> {
        let removed = self.manager.remove_island(id)?;
        self.ssr.remove(removed.id());
        Ok(())
    }

    /// Mount the island if it is not live yet, then hydrate it.
    pub async fn hydrate_one(&mut self, id: &str) -> Result<HydrationSummary, IslandError> {
        let before = self
            .manager
            .island(id)
            .ok_or_else(|| IslandError::not_found(id))?
            .state();
        if before.can_mount() {
            self.manager.mount_island(id).await?;
        }
        self.manager.hydrate_island(id).await?;

        let island = self
            .manager
            .island(id)
            .ok_or_else(|| IslandError::not_found(id))?;
        let message = if island.hydrate() {
            "Island hydrated successfully"
        } else {
            "Island mounted; hydration disabled"
        };
        let now_hydrated = island.state() == IslandState::Hydrated;
        Ok(HydrationSummary {
            hydrated_count: usize::from(now_hydrated && before != IslandState::Hydrated),
            message: message.to_string(),
            failures: Vec::new(),
        })
    }

    pub async fn hydrate_all(&mut self) -> HydrationSummary {
        let report = self.scheduler.run_all(&mut self.manager).await;
        HydrationSummary::from(&report)
    }

    #[must_use]
    pub fn stats(&self) -> IslandStats {
        self.manager.stats()
    }
}
