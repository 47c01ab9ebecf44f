use chrono::Utc;

use crate::{
    db::{DbPool, is_unique_violation},
    error::{AppError, Result},
    models::user::User,
};

/// User store for database operations
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    /// Create a new UserStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User"))?;

        Ok(user)
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    /// Create a user with an already-hashed password
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("User \"{}\" already exists", username))
            } else {
                AppError::Database(e)
            }
        })?;

        self.get_user_by_id(result.last_insert_rowid()).await
    }

    /// Seed the initial administrator account when the table is empty, so
    /// the admin surface is reachable on a fresh database.
    pub async fn ensure_initial_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if count.0 == 0 {
            self.create_user(username, email, password_hash, true)
                .await?;
            tracing::info!(username, "created initial admin user");
        }

        Ok(())
    }
}
