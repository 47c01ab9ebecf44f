use chrono::Utc;

use crate::{
    db::{DbPool, generate_token, is_unique_violation},
    error::{AppError, Result},
    models::supervisor::{Supervisor, SupervisorInput},
};

/// Supervisor store for database operations
pub struct SupervisorStore {
    pool: DbPool,
}

impl SupervisorStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Supervisor>> {
        let supervisors =
            sqlx::query_as::<_, Supervisor>("SELECT * FROM supervisors ORDER BY surname, name")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(supervisors)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Supervisor> {
        let supervisor = sqlx::query_as::<_, Supervisor>("SELECT * FROM supervisors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Supervisor"))?;

        Ok(supervisor)
    }

    pub async fn create(&self, input: SupervisorInput) -> Result<Supervisor> {
        let result = sqlx::query(
            r#"
            INSERT INTO supervisors (name, surname, email, token, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.surname)
        .bind(&input.email)
        .bind(generate_token())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Supervisor email \"{}\" already exists", input.email))
            } else {
                AppError::Database(e)
            }
        })?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: SupervisorInput) -> Result<Supervisor> {
        let existing = self.get_by_id(id).await?;

        sqlx::query("UPDATE supervisors SET name = ?, surname = ?, email = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.surname)
            .bind(&input.email)
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Supervisor email \"{}\" already exists", input.email))
                } else {
                    AppError::Database(e)
                }
            })?;

        self.get_by_id(id).await
    }

    /// Delete a supervisor together with its assignments. Orders are
    /// untouched; they reference the school, not the assignment. Schools
    /// that lose their primary assignment get the oldest remaining one
    /// promoted.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let affected_schools: Vec<(i64,)> =
            sqlx::query_as("SELECT school_id FROM assignments WHERE supervisor_id = ?")
                .bind(existing.id)
                .fetch_all(&mut *tx)
                .await
                .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM assignments WHERE supervisor_id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM supervisors WHERE id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for (school_id,) in affected_schools {
            super::assignment_store::promote_oldest_if_unset(&mut *tx, school_id)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}
