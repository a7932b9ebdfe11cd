//! File-backed JSON formats: the catalog file and the client progress file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use portal_core::model::{Material, ProgressMap};
use serde::{Deserialize, Serialize};

use crate::repository::{MaterialRecord, ProgressBackend, StorageError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    materials: Vec<MaterialRecord>,
}

/// Reads a catalog file (`{ "materials": [...] }`).
///
/// A missing or blank file is an empty catalog. Anything else that does not
/// parse is an error rather than an empty list, so a later save cannot wipe
/// a damaged file.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed content or invalid
/// materials, `StorageError::Connection` for other I/O failures.
pub fn read_catalog(path: &Path) -> Result<Vec<Material>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StorageError::Connection(err.to_string())),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let doc: CatalogDocument =
        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
    doc.materials
        .into_iter()
        .map(|record| {
            record
                .into_material()
                .map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .collect()
}

/// Writes `materials` to a catalog file, pretty-printed.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn write_catalog(path: &Path, materials: &[Material]) -> Result<(), StorageError> {
    let doc = CatalogDocument {
        materials: materials.iter().map(MaterialRecord::from_material).collect(),
    };
    let raw = serde_json::to_string_pretty(&doc)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    fs::write(path, raw).map_err(|e| StorageError::Connection(e.to_string()))
}

/// Progress persisted as a flat JSON object `{ "<materialId>": <percent> }`.
#[derive(Debug, Clone)]
pub struct JsonFileProgressBackend {
    path: PathBuf,
}

impl JsonFileProgressBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressBackend for JsonFileProgressBackend {
    fn load_all(&self) -> Result<ProgressMap, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ProgressMap::new()),
            Err(err) => return Err(StorageError::Connection(err.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(ProgressMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn save_all(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let raw = serde_json::to_string(progress)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StorageError::Connection(e.to_string()))
    }
}
