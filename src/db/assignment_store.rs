use chrono::Utc;

use crate::{
    db::{DbPool, is_unique_violation},
    error::{AppError, Result},
    models::assignment::{Assignment, AssignmentInput},
};

/// Assignment registry: supervisor–school associations. One assignment per
/// school is primary and receives that school's orders.
pub struct AssignmentStore {
    pool: DbPool,
}

impl AssignmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Assignment>> {
        let assignments =
            sqlx::query_as::<_, Assignment>("SELECT * FROM assignments ORDER BY school_id, created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(assignments)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Assignment> {
        let assignment = sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Assignment"))?;

        Ok(assignment)
    }

    /// The school's primary assignment, if any. Order routing target.
    pub async fn get_primary_for_school(&self, school_id: i64) -> Result<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM assignments WHERE school_id = ? AND is_primary = 1",
        )
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(assignment)
    }

    /// Link a supervisor to a school. The first assignment for a school
    /// becomes primary. Duplicate pairs are rejected.
    pub async fn create(&self, input: AssignmentInput) -> Result<Assignment> {
        // Both ends of the link must exist
        let supervisor: Option<(i64,)> = sqlx::query_as("SELECT id FROM supervisors WHERE id = ?")
            .bind(input.supervisor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if supervisor.is_none() {
            return Err(AppError::NotFound("Supervisor"));
        }

        let school: Option<(i64,)> = sqlx::query_as("SELECT id FROM schools WHERE id = ?")
            .bind(input.school_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if school.is_none() {
            return Err(AppError::NotFound("School"));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let existing_primary: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM assignments WHERE school_id = ? AND is_primary = 1",
        )
        .bind(input.school_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let result = sqlx::query(
            r#"
            INSERT INTO assignments (supervisor_id, school_id, is_primary, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(input.supervisor_id)
        .bind(input.school_id)
        .bind(existing_primary.is_none())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Supervisor is already assigned to this school".into())
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_rowid();
        tx.commit().await.map_err(AppError::Database)?;

        self.get_by_id(id).await
    }

    /// Unconditional delete. Existing orders are untouched; they reference
    /// the school, not the assignment. Deleting the primary promotes the
    /// oldest remaining assignment for that school.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id).await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM assignments WHERE id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        promote_oldest_if_unset(&mut *tx, existing.school_id)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}

/// Make the oldest assignment of the school primary when the school has
/// assignments but no primary one. No-op otherwise.
pub(crate) async fn promote_oldest_if_unset<'e, E>(executor: E, school_id: i64) -> sqlx::Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE assignments SET is_primary = 1
        WHERE id = (
            SELECT id FROM assignments WHERE school_id = ? ORDER BY created_at, id LIMIT 1
        )
        AND NOT EXISTS (
            SELECT 1 FROM assignments WHERE school_id = ? AND is_primary = 1
        )
        "#,
    )
    .bind(school_id)
    .bind(school_id)
    .execute(executor)
    .await?;

    Ok(())
}
