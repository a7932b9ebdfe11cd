//! Shared error types for the services crate.

use thiserror::Error;

use portal_core::model::MaterialId;
use portal_core::sequence::SequenceError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService` and everything built on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("material not found: {0}")]
    NotFound(MaterialId),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping portal services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PortalServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
