use portal_core::model::{Material, MaterialId, MaterialKind};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn position_from_index(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn map_material_row(row: &SqliteRow) -> Result<Material, StorageError> {
    let id = MaterialId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let kind: MaterialKind = row
        .try_get::<String, _>("kind")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let url: Option<String> = row.try_get("url").map_err(ser)?;
    let description: Option<String> = row.try_get("description").map_err(ser)?;

    Material::new(
        id,
        row.try_get::<String, _>("title").map_err(ser)?,
        kind,
        row.try_get::<String, _>("subject").map_err(ser)?,
        row.try_get("topic").map_err(ser)?,
        url.as_deref(),
    )
    .map(|m| m.with_description(description))
    .map_err(ser)
}
