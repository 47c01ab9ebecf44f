use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::warehouse::{Warehouse, WarehouseInput},
};

/// Warehouse (bodega) store for database operations
pub struct WarehouseStore {
    pool: DbPool,
}

impl WarehouseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(warehouses)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Warehouse> {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Warehouse"))?;

        Ok(warehouse)
    }

    pub async fn create(&self, input: WarehouseInput) -> Result<Warehouse> {
        let result =
            sqlx::query("INSERT INTO warehouses (name, location, created_at) VALUES (?, ?, ?)")
                .bind(&input.name)
                .bind(&input.location)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: WarehouseInput) -> Result<Warehouse> {
        let existing = self.get_by_id(id).await?;

        sqlx::query("UPDATE warehouses SET name = ?, location = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.location)
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id).await?;

        sqlx::query("DELETE FROM warehouses WHERE id = ?")
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
