//! Listing view: every material as a tile, grouped the way the portal shows
//! them.

use std::sync::Arc;

use portal_core::model::{
    Material, MaterialId, MaterialKind, Percent, ProgressState, Session, Viewer,
};
use portal_core::sequence;
use portal_core::{AccessDecision, Clock};
use serde::Serialize;
use tracing::debug;

use crate::catalog_service::{CatalogService, decide};
use crate::error::CatalogError;
use crate::interaction::{self, OpenOutcome};
use crate::progress_store::ProgressStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTile {
    pub id: MaterialId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: MaterialKind,
    pub progress: Percent,
    pub state: ProgressState,
    pub access: AccessDecision,
    pub has_url: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileGroup {
    pub subject: String,
    pub topic: String,
    pub tiles: Vec<MaterialTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSection {
    pub kind: MaterialKind,
    pub groups: Vec<TileGroup>,
}

impl DashboardSection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &MaterialTile> {
        self.groups.iter().flat_map(|g| g.tiles.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub trial_expired: bool,
    /// One section per material kind, in display order, empty ones included.
    pub sections: Vec<DashboardSection>,
}

impl Dashboard {
    #[must_use]
    pub fn section(&self, kind: MaterialKind) -> Option<&DashboardSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    #[must_use]
    pub fn tile(&self, id: &MaterialId) -> Option<&MaterialTile> {
        self.sections
            .iter()
            .flat_map(DashboardSection::tiles)
            .find(|t| &t.id == id)
    }
}

/// Builds the dashboard for `viewer` from the catalog in persisted order.
#[must_use]
pub fn build_dashboard(viewer: &Viewer, all: &[Material], progress: &ProgressStore) -> Dashboard {
    let groups = sequence::groups(all);
    let sections = MaterialKind::ALL
        .into_iter()
        .map(|kind| DashboardSection {
            kind,
            groups: groups
                .iter()
                .filter(|g| g.key.kind == kind)
                .map(|group| TileGroup {
                    subject: group.key.subject.clone(),
                    topic: group.key.topic.clone(),
                    tiles: group
                        .slots()
                        .into_iter()
                        .map(|slot| tile(slot.material, decide(viewer, &slot, progress), progress))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Dashboard {
        trial_expired: viewer.is_trial_expired(),
        sections,
    }
}

fn tile(material: &Material, access: AccessDecision, progress: &ProgressStore) -> MaterialTile {
    let value = progress.get_progress(material.id());
    MaterialTile {
        id: material.id().clone(),
        title: material.title().to_owned(),
        description: material.description().map(ToOwned::to_owned),
        kind: material.kind(),
        progress: value,
        state: value.state(),
        access,
        has_url: material.has_url(),
    }
}

/// Session-facing entry point: resolves viewers with the service clock and
/// keeps catalog reads and progress together.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    catalog: Arc<CatalogService>,
    progress: ProgressStore,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<CatalogService>, progress: ProgressStore) -> Self {
        Self {
            clock,
            catalog,
            progress,
        }
    }

    #[must_use]
    pub fn viewer(&self, session: &Session) -> Viewer {
        session.viewer(self.clock.now())
    }

    /// Dashboard for an already derived viewer.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn dashboard(&self, viewer: &Viewer) -> Result<Dashboard, CatalogError> {
        let all = self.catalog.list_materials().await?;
        Ok(build_dashboard(viewer, &all, &self.progress))
    }

    /// Dashboard for `session` as of the service clock.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn dashboard_for(&self, session: &Session) -> Result<Dashboard, CatalogError> {
        self.dashboard(&self.viewer(session)).await
    }

    /// Opens a material for `session`, recording completion where opening
    /// is enough.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids.
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn open_material(
        &self,
        session: &Session,
        id: &MaterialId,
    ) -> Result<OpenOutcome, CatalogError> {
        let viewer = self.viewer(session);
        let (material, decision) = self.catalog.access_for(&viewer, id, &self.progress).await?;
        let outcome = interaction::open_material(decision, &material, &self.progress);
        debug!(material = %id, locked = outcome.is_locked(), "material opened");
        Ok(outcome)
    }
}
