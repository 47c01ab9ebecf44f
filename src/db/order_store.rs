use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::order::{Order, OrderDetail, OrderLineDetail, OrderStatus},
};

/// Order (solicitud) store. Read queries run against the pool; the
/// workflow primitives take a transaction connection so submission and
/// approval stay all-or-nothing.
pub struct OrderStore {
    pool: DbPool,
}

/// Order line joined with the product's current stock, read inside the
/// approval transaction.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LineStock {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub stock: i64,
}

impl OrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(orders)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Order"))?;

        Ok(order)
    }

    /// Order plus its lines joined with product name and code
    pub async fn get_detail(&self, id: i64) -> Result<OrderDetail> {
        let order = self.get_by_id(id).await?;

        let lines = sqlx::query_as::<_, OrderLineDetail>(
            r#"
            SELECT l.product_id, p.name AS product_name, p.code AS product_code, l.quantity
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = ?
            ORDER BY l.id
            "#,
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(OrderDetail { order, lines })
    }

    /// Orders a school created at or after the given instant. Drives the
    /// rolling-window rate limit.
    pub async fn count_for_school_since(
        &self,
        school_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE school_id = ? AND created_at >= ?",
        )
        .bind(school_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count.0)
    }

    // Transaction-scoped primitives below. Callers own the transaction;
    // dropping it without commit rolls everything back.

    pub(crate) async fn get_tx(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub(crate) async fn product_exists(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(row.is_some())
    }

    pub(crate) async fn insert_order(
        conn: &mut SqliteConnection,
        school_id: i64,
        requester_name: &str,
        notes: &str,
        created_at: DateTime<Utc>,
    ) -> sqlx::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (school_id, requester_name, notes, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(school_id)
        .bind(requester_name)
        .bind(notes)
        .bind(OrderStatus::Pending)
        .bind(created_at)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub(crate) async fn insert_line(
        conn: &mut SqliteConnection,
        order_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO order_lines (order_id, product_id, quantity) VALUES (?, ?, ?)")
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub(crate) async fn lines_with_stock(
        conn: &mut SqliteConnection,
        order_id: i64,
    ) -> sqlx::Result<Vec<LineStock>> {
        sqlx::query_as::<_, LineStock>(
            r#"
            SELECT l.product_id, p.name AS product_name, l.quantity, p.quantity AS stock
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = ?
            ORDER BY l.id
            "#,
        )
        .bind(order_id)
        .fetch_all(conn)
        .await
    }

    /// Decrement stock, guarded so a concurrent approval can never push the
    /// quantity negative. Returns the number of affected rows; zero means
    /// the guard refused.
    pub(crate) async fn decrement_stock(
        conn: &mut SqliteConnection,
        product_id: i64,
        quantity: i64,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity - ? WHERE id = ? AND quantity >= ?",
        )
        .bind(quantity)
        .bind(product_id)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Resolve a pending order. Returns zero affected rows when the order
    /// was already processed, keeping the transition one-directional.
    pub(crate) async fn resolve_if_pending(
        conn: &mut SqliteConnection,
        id: i64,
        status: OrderStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> sqlx::Result<u64> {
        let result =
            sqlx::query("UPDATE orders SET status = ?, approved_at = ? WHERE id = ? AND status = ?")
                .bind(status)
                .bind(approved_at)
                .bind(id)
                .bind(OrderStatus::Pending)
                .execute(conn)
                .await?;

        Ok(result.rows_affected())
    }
}
