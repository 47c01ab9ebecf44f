use chrono::Utc;

use crate::{
    db::{DbPool, generate_token},
    error::{AppError, Result},
    models::school::{School, SchoolInput},
};

/// School (escuela) store for database operations
pub struct SchoolStore {
    pool: DbPool,
}

impl SchoolStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<School>> {
        let schools = sqlx::query_as::<_, School>("SELECT * FROM schools ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(schools)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<School> {
        let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("School"))?;

        Ok(school)
    }

    /// Resolve the opaque identifying token from a public order submission
    pub async fn get_by_token(&self, token: &str) -> Result<Option<School>> {
        let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(school)
    }

    pub async fn create(&self, input: SchoolInput) -> Result<School> {
        let result = sqlx::query(
            "INSERT INTO schools (name, token, address, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(generate_token())
        .bind(&input.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: SchoolInput) -> Result<School> {
        let existing = self.get_by_id(id).await?;

        sqlx::query("UPDATE schools SET name = ?, address = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.address)
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.get_by_id(id).await
    }

    /// Delete a school and its assignments. Refused while orders for the
    /// school exist, since orders reference the school directly.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id).await?;

        let orders: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE school_id = ?")
            .bind(existing.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if orders.0 > 0 {
            return Err(AppError::Conflict("School has existing orders".into()));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM assignments WHERE school_id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM schools WHERE id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}
