use std::sync::Arc;

use portal_core::model::{Material, MaterialId, Viewer};
use portal_core::sequence::{self, GroupKey, MoveDirection, MoveOutcome, SiblingSlot};
use portal_core::{AccessDecision, evaluate_access};
use storage::repository::MaterialRepository;
use tracing::info;

use crate::error::CatalogError;
use crate::progress_store::ProgressStore;

/// Reads the ordered catalog and answers sequence and access questions
/// against it.
#[derive(Clone)]
pub struct CatalogService {
    materials: Arc<dyn MaterialRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(materials: Arc<dyn MaterialRepository>) -> Self {
        Self { materials }
    }

    /// The whole catalog in persisted order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn list_materials(&self) -> Result<Vec<Material>, CatalogError> {
        Ok(self.materials.list_materials().await?)
    }

    /// Fetch one material.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids.
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn get_material(&self, id: &MaterialId) -> Result<Material, CatalogError> {
        self.materials
            .get_material(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Members of one sibling group, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn sequence(&self, key: &GroupKey) -> Result<Vec<Material>, CatalogError> {
        let all = self.list_materials().await?;
        Ok(sequence::siblings(&all, key).into_iter().cloned().collect())
    }

    /// Loads `id` and decides whether `viewer` may open it, given the progress
    /// recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids.
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn access_for(
        &self,
        viewer: &Viewer,
        id: &MaterialId,
        progress: &ProgressStore,
    ) -> Result<(Material, AccessDecision), CatalogError> {
        let all = self.list_materials().await?;
        let slot = sequence::slot_of(&all, id).ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        let decision = decide(viewer, &slot, progress);
        Ok((slot.material.clone(), decision))
    }

    /// Swaps `id` with its nearest same-subject neighbour and persists the
    /// new catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Sequence` for unknown ids.
    /// Returns `CatalogError::Storage` if the catalog cannot be read or written.
    pub async fn move_material(
        &self,
        id: &MaterialId,
        direction: MoveDirection,
    ) -> Result<MoveOutcome, CatalogError> {
        let mut all = self.list_materials().await?;
        let outcome = sequence::move_material(&mut all, id, direction)?;
        if outcome == MoveOutcome::Moved {
            let order: Vec<MaterialId> = all.iter().map(|m| m.id().clone()).collect();
            self.materials.save_order(&order).await?;
            info!(material = %id, ?direction, "material reordered");
        }
        Ok(outcome)
    }
}

/// Access decision for one slot, reading the predecessor's progress from
/// `progress`.
pub(crate) fn decide(viewer: &Viewer, slot: &SiblingSlot<'_>, progress: &ProgressStore) -> AccessDecision {
    let previous = slot.previous.map(|prev| progress.get_progress(prev.id()));
    evaluate_access(viewer, slot.material, slot.index, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::LockReason;
    use portal_core::model::{MaterialKind, Role};
    use storage::repository::InMemoryRepository;

    fn video(id: &str, subject: &str) -> Material {
        Material::new(
            MaterialId::new(id).unwrap(),
            format!("Video {id}"),
            MaterialKind::Video,
            subject,
            None,
            None,
        )
        .unwrap()
    }

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryRepository::with_materials(vec![
            video("v1", "Math"),
            video("p1", "Physics"),
            video("v2", "Math"),
        ])))
    }

    fn id(raw: &str) -> MaterialId {
        MaterialId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn access_reads_previous_sibling_progress() {
        let catalog = service();
        let store = ProgressStore::ephemeral();
        let viewer = Viewer::new(Role::Student, false, true);

        let (material, decision) = catalog.access_for(&viewer, &id("v2"), &store).await.unwrap();
        assert_eq!(material.id(), &id("v2"));
        assert_eq!(
            decision,
            AccessDecision::Locked(LockReason::SequentialPrerequisiteIncomplete)
        );

        store.set_progress(&id("v1"), 100.0);
        let (_, decision) = catalog.access_for(&viewer, &id("v2"), &store).await.unwrap();
        assert_eq!(decision, AccessDecision::Unlocked);
    }

    #[tokio::test]
    async fn access_for_unknown_id_is_not_found() {
        let catalog = service();
        let viewer = Viewer::new(Role::Student, false, true);
        let err = catalog
            .access_for(&viewer, &id("ghost"), &ProgressStore::ephemeral())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(missing) if missing == id("ghost")));
    }

    #[tokio::test]
    async fn move_persists_order_and_reshapes_sequence() {
        let catalog = service();
        assert_eq!(
            catalog.move_material(&id("v2"), MoveDirection::Up).await.unwrap(),
            MoveOutcome::Moved
        );

        let listed: Vec<String> = catalog
            .list_materials()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id().to_string())
            .collect();
        assert_eq!(listed, ["v2", "p1", "v1"]);

        let key = GroupKey::new(MaterialKind::Video, "Math", "general");
        let sequence: Vec<String> = catalog
            .sequence(&key)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id().to_string())
            .collect();
        assert_eq!(sequence, ["v2", "v1"]);
    }

    #[tokio::test]
    async fn move_at_boundary_leaves_catalog_alone() {
        let catalog = service();
        assert_eq!(
            catalog.move_material(&id("p1"), MoveDirection::Down).await.unwrap(),
            MoveOutcome::AtBoundary
        );
        assert!(matches!(
            catalog.move_material(&id("ghost"), MoveDirection::Up).await,
            Err(CatalogError::Sequence(_))
        ));
    }
}
