use chrono::Utc;

use crate::{
    db::{DbPool, is_unique_violation},
    error::{AppError, Result},
    models::product::{NewProduct, Product, ProductUpdate},
};

/// Product store for database operations. Stock decrements during order
/// approval live in the order store so they share the approval transaction;
/// everything else about products is here.
pub struct ProductStore {
    pool: DbPool,
}

impl ProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(products)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Product"))?;

        Ok(product)
    }

    pub async fn create(&self, input: NewProduct) -> Result<Product> {
        if input.quantity < 0 {
            return Err(AppError::BadRequest(
                "Product quantity cannot be negative".into(),
            ));
        }

        let result =
            sqlx::query("INSERT INTO products (name, code, quantity, created_at) VALUES (?, ?, ?, ?)")
                .bind(&input.name)
                .bind(&input.code)
                .bind(input.quantity)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict(format!("Product code \"{}\" already exists", input.code))
                    } else {
                        AppError::Database(e)
                    }
                })?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: ProductUpdate) -> Result<Product> {
        let existing = self.get_by_id(id).await?;

        sqlx::query("UPDATE products SET name = ?, code = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.code)
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Product code \"{}\" already exists", input.code))
                } else {
                    AppError::Database(e)
                }
            })?;

        self.get_by_id(id).await
    }

    /// Direct stock edit: set quantity on hand to an absolute value
    pub async fn set_stock(&self, id: i64, quantity: i64) -> Result<Product> {
        if quantity < 0 {
            return Err(AppError::BadRequest(
                "Product quantity cannot be negative".into(),
            ));
        }

        let existing = self.get_by_id(id).await?;

        sqlx::query("UPDATE products SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id).await?;

        let referenced: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_lines WHERE product_id = ?")
                .bind(existing.id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if referenced.0 > 0 {
            return Err(AppError::Conflict(
                "Product is referenced by existing orders".into(),
            ));
        }

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(existing.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Products at or below the given quantity threshold, for the low-stock check
    pub async fn find_low_stock(&self, threshold: i64) -> Result<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE quantity <= ? ORDER BY quantity")
                .bind(threshold)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(products)
    }
}
