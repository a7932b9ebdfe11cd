use std::collections::HashSet;

use portal_core::model::{Material, MaterialId};

use super::SqliteRepository;
use super::mapping::{conn, map_material_row, position_from_index};
use crate::repository::{MaterialRepository, StorageError};

const SELECT_COLUMNS: &str = "SELECT id, title, description, kind, subject, topic, url FROM materials";

#[async_trait::async_trait]
impl MaterialRepository for SqliteRepository {
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY position ASC, id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut materials = Vec::with_capacity(rows.len());
        for row in rows {
            materials.push(map_material_row(&row)?);
        }
        Ok(materials)
    }

    async fn get_material(&self, id: &MaterialId) -> Result<Option<Material>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => map_material_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO materials (id, position, title, description, kind, subject, topic, url)
            VALUES (
                ?1,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM materials),
                ?2, ?3, ?4, ?5, ?6, ?7
            )
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(material.id().as_str())
        .bind(material.title())
        .bind(material.description())
        .bind(material.kind().as_str())
        .bind(material.subject())
        .bind(material.topic())
        .bind(material.url().map(|u| u.as_str()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "material {} already exists",
                material.id()
            )));
        }
        Ok(())
    }

    async fn update_material(&self, material: &Material) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE materials SET
                title = ?2,
                description = ?3,
                kind = ?4,
                subject = ?5,
                topic = ?6,
                url = ?7
            WHERE id = ?1
            ",
        )
        .bind(material.id().as_str())
        .bind(material.title())
        .bind(material.description())
        .bind(material.kind().as_str())
        .bind(material.subject())
        .bind(material.topic())
        .bind(material.url().map(|u| u.as_str()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_material(&self, id: &MaterialId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn save_order(&self, order: &[MaterialId]) -> Result<(), StorageError> {
        let unique: HashSet<&MaterialId> = order.iter().collect();
        if unique.len() != order.len() {
            return Err(StorageError::Conflict("duplicate material in order".into()));
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;
        if usize::try_from(count).ok() != Some(order.len()) {
            return Err(StorageError::Conflict("order does not cover the catalog".into()));
        }

        for (index, id) in order.iter().enumerate() {
            let res = sqlx::query("UPDATE materials SET position = ?1 WHERE id = ?2")
                .bind(position_from_index(index)?)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            if res.rows_affected() == 0 {
                return Err(StorageError::Conflict(format!("unknown material {id}")));
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
