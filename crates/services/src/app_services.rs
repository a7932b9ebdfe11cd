use std::path::PathBuf;
use std::sync::Arc;

use portal_core::model::Material;
use storage::json::JsonFileProgressBackend;
use storage::repository::{InMemoryRepository, MaterialRepository, Storage};

use crate::catalog_service::CatalogService;
use crate::dashboard::DashboardService;
use crate::error::PortalServicesError;
use crate::progress_store::ProgressStore;
use crate::Clock;

/// Assembles the portal services for one client session.
///
/// Owns the single `ProgressStore` every view and player shares.
#[derive(Clone)]
pub struct PortalServices {
    progress: ProgressStore,
    catalog: Arc<CatalogService>,
    dashboard: Arc<DashboardService>,
}

impl PortalServices {
    /// Build services over a `SQLite` catalog and a JSON progress file.
    ///
    /// An unreadable progress file does not fail start-up; the store falls
    /// back to memory.
    ///
    /// # Errors
    ///
    /// Returns `PortalServicesError` if the catalog database cannot be opened.
    pub async fn new_sqlite(
        db_url: &str,
        progress_path: impl Into<PathBuf>,
        clock: Clock,
    ) -> Result<Self, PortalServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let progress = ProgressStore::open(Arc::new(JsonFileProgressBackend::new(progress_path)));
        Ok(Self::assemble(storage.materials, progress, clock))
    }

    /// Services over an in-memory catalog with nothing persisted.
    #[must_use]
    pub fn in_memory(materials: Vec<Material>, clock: Clock) -> Self {
        Self::assemble(
            Arc::new(InMemoryRepository::with_materials(materials)),
            ProgressStore::ephemeral(),
            clock,
        )
    }

    /// Services over caller-provided parts.
    #[must_use]
    pub fn assemble(
        materials: Arc<dyn MaterialRepository>,
        progress: ProgressStore,
        clock: Clock,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(materials));
        let dashboard = Arc::new(DashboardService::new(
            clock,
            Arc::clone(&catalog),
            progress.clone(),
        ));
        Self {
            progress,
            catalog,
            dashboard,
        }
    }

    #[must_use]
    pub fn progress(&self) -> ProgressStore {
        self.progress.clone()
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
