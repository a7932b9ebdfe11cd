use async_trait::async_trait;
use portal_core::model::{Material, MaterialError, MaterialId, MaterialKind, ProgressMap};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a material, as written to catalog files.
///
/// Field names follow the catalog JSON (`type`, camelCase) so files written
/// by the portal's admin tools load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    pub id: MaterialId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MaterialRecord {
    #[must_use]
    pub fn from_material(material: &Material) -> Self {
        Self {
            id: material.id().clone(),
            title: material.title().to_owned(),
            description: material.description().map(ToOwned::to_owned),
            kind: material.kind(),
            subject: material.subject().to_owned(),
            topic: material.topic().map(ToOwned::to_owned),
            url: material.url().map(ToString::to_string),
        }
    }

    /// Convert the record back into a domain `Material`.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the record fails domain validation.
    pub fn into_material(self) -> Result<Material, MaterialError> {
        Material::new(
            self.id,
            self.title,
            self.kind,
            self.subject,
            self.topic,
            self.url.as_deref(),
        )
        .map(|m| m.with_description(self.description))
    }
}

/// Repository contract for the ordered material catalog.
///
/// `list_materials` returns the catalog in its persisted order; that order is
/// what sibling sequences are built from.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// All materials in persisted order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError>;

    /// Fetch a material by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures. A missing id is `Ok(None)`.
    async fn get_material(&self, id: &MaterialId) -> Result<Option<Material>, StorageError>;

    /// Append a new material at the end of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is already taken.
    async fn insert_material(&self, material: &Material) -> Result<(), StorageError>;

    /// Replace a material's fields, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    async fn update_material(&self, material: &Material) -> Result<(), StorageError>;

    /// Remove a material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    async fn delete_material(&self, id: &MaterialId) -> Result<(), StorageError>;

    /// Persist a new catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` unless `order` is a permutation of the
    /// stored ids.
    async fn save_order(&self, order: &[MaterialId]) -> Result<(), StorageError>;
}

/// Backing surface of the progress store: read and write the whole map.
pub trait ProgressBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backing storage is unreadable.
    fn load_all(&self) -> Result<ProgressMap, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the map cannot be written.
    fn save_all(&self, progress: &ProgressMap) -> Result<(), StorageError>;
}

/// Simple in-memory catalog for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    materials: Arc<Mutex<Vec<Material>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `materials` in the given order.
    #[must_use]
    pub fn with_materials(materials: Vec<Material>) -> Self {
        Self {
            materials: Arc::new(Mutex::new(materials)),
        }
    }
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn get_material(&self, id: &MaterialId) -> Result<Option<Material>, StorageError> {
        let guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|m| m.id() == id).cloned())
    }

    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        let mut guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|m| m.id() == material.id()) {
            return Err(StorageError::Conflict(format!(
                "material {} already exists",
                material.id()
            )));
        }
        guard.push(material.clone());
        Ok(())
    }

    async fn update_material(&self, material: &Material) -> Result<(), StorageError> {
        let mut guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let slot = guard
            .iter_mut()
            .find(|m| m.id() == material.id())
            .ok_or(StorageError::NotFound)?;
        *slot = material.clone();
        Ok(())
    }

    async fn delete_material(&self, id: &MaterialId) -> Result<(), StorageError> {
        let mut guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let index = guard
            .iter()
            .position(|m| m.id() == id)
            .ok_or(StorageError::NotFound)?;
        guard.remove(index);
        Ok(())
    }

    async fn save_order(&self, order: &[MaterialId]) -> Result<(), StorageError> {
        let mut guard = self
            .materials
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if order.len() != guard.len() {
            return Err(StorageError::Conflict("order does not cover the catalog".into()));
        }
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            let material = guard
                .iter()
                .find(|m| m.id() == id)
                .ok_or_else(|| StorageError::Conflict(format!("unknown material {id}")))?;
            if reordered.iter().any(|m: &Material| m.id() == id) {
                return Err(StorageError::Conflict(format!("duplicate material {id}")));
            }
            reordered.push(material.clone());
        }
        *guard = reordered;
        Ok(())
    }
}

/// Progress kept only in process memory; the fallback when nothing durable
/// is configured.
#[derive(Clone, Default)]
pub struct InMemoryProgressBackend {
    progress: Arc<Mutex<ProgressMap>>,
}

impl InMemoryProgressBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressBackend for InMemoryProgressBackend {
    fn load_all(&self) -> Result<ProgressMap, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clone_from(progress);
        Ok(())
    }
}

/// Aggregates the catalog repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub materials: Arc<dyn MaterialRepository>,
}
