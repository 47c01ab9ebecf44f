use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::db::{
    DbPool, assignment_store::AssignmentStore, order_store::OrderStore, school_store::SchoolStore,
};
use crate::error::AppError;
use crate::models::order::{Order, OrderDetail, OrderStatus, OrderSubmission};
use crate::services::notification_service::NotificationService;

/// Most orders a school may place inside the rolling window
pub const MAX_ORDERS_PER_WINDOW: i64 = 2;
/// Length of the rolling rate-limit window
pub const ORDER_WINDOW_DAYS: i64 = 7;
/// Per-product quantity cap within one order
pub const MAX_QUANTITY_PER_PRODUCT: i64 = 3;

/// Order placement and approval workflow. Submission validates the school
/// token, routing, rate limit and quantity caps before persisting; approval
/// moves stock and the order state inside one transaction.
pub struct OrderService {
    pool: DbPool,
    schools: SchoolStore,
    assignments: AssignmentStore,
    orders: OrderStore,
    notifications: Arc<NotificationService>,
}

impl OrderService {
    pub fn new(pool: DbPool, notifications: Arc<NotificationService>) -> Self {
        Self {
            schools: SchoolStore::new(pool.clone()),
            assignments: AssignmentStore::new(pool.clone()),
            orders: OrderStore::new(pool.clone()),
            pool,
            notifications,
        }
    }

    /// Create a pending order from a public submission. Persists the order
    /// and its lines as a single unit; stock is untouched until approval.
    pub async fn submit(&self, submission: OrderSubmission) -> Result<OrderDetail, OrderError> {
        let school = self
            .schools
            .get_by_token(&submission.school_token)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or(OrderError::UnknownSchool)?;

        // An order with no supervisor has nowhere to be routed
        self.assignments
            .get_primary_for_school(school.id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or(OrderError::NoSupervisor)?;

        if submission.requester_name.trim().is_empty() {
            return Err(OrderError::MissingRequester);
        }

        let since = Utc::now() - Duration::days(ORDER_WINDOW_DAYS);
        let recent = self
            .orders
            .count_for_school_since(school.id, since)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;

        if recent >= MAX_ORDERS_PER_WINDOW {
            return Err(OrderError::WeeklyLimitReached);
        }

        // Collapse repeated product entries before checking the cap, so a
        // split 2+2 cannot sneak past the per-product limit
        let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
        for item in &submission.items {
            if item.quantity > 0 {
                *requested.entry(item.product_id).or_insert(0) += item.quantity;
            }
        }

        for (&product_id, &quantity) in &requested {
            if quantity > MAX_QUANTITY_PER_PRODUCT {
                return Err(OrderError::QuantityLimitExceeded(product_id));
            }
        }

        if requested.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let mut tx = self.pool.begin().await?;

        for &product_id in requested.keys() {
            if !OrderStore::product_exists(&mut tx, product_id).await? {
                return Err(OrderError::UnknownProduct(product_id));
            }
        }

        let order_id = OrderStore::insert_order(
            &mut tx,
            school.id,
            &submission.requester_name,
            &submission.notes,
            Utc::now(),
        )
        .await?;

        for (&product_id, &quantity) in &requested {
            OrderStore::insert_line(&mut tx, order_id, product_id, quantity).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id, school_id = school.id, "order submitted");

        let detail = self
            .orders
            .get_detail(order_id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;

        // Non-critical side effect, failures logged inside
        self.notifications.check_low_stock().await;

        Ok(detail)
    }

    /// Approve a pending order, decrementing stock for every line. The
    /// whole operation commits or rolls back as one: a single line short
    /// on stock aborts with no partial decrement.
    pub async fn approve(&self, order_id: i64) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderStore::get_tx(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        let lines = OrderStore::lines_with_stock(&mut tx, order_id).await?;

        for line in &lines {
            if line.stock < line.quantity {
                return Err(OrderError::InsufficientStock(line.product_name.clone()));
            }
        }

        for line in &lines {
            let affected =
                OrderStore::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
            if affected == 0 {
                return Err(OrderError::InsufficientStock(line.product_name.clone()));
            }
        }

        let affected =
            OrderStore::resolve_if_pending(&mut tx, order_id, OrderStatus::Approved, Some(Utc::now()))
                .await?;
        if affected == 0 {
            return Err(OrderError::AlreadyProcessed);
        }

        tx.commit().await?;

        tracing::info!(order_id, "order approved");

        // Runs after the commit; a delivery failure never rolls back the
        // approval
        self.notifications.check_low_stock().await;

        self.orders
            .get_by_id(order_id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Reject a pending order. No stock effect.
    pub async fn reject(&self, order_id: i64) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderStore::get_tx(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        OrderStore::resolve_if_pending(&mut tx, order_id, OrderStatus::Rejected, None).await?;

        tx.commit().await?;

        tracing::info!(order_id, "order rejected");

        self.orders
            .get_by_id(order_id)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Unknown school token")]
    UnknownSchool,
    #[error("School has no supervisor assigned")]
    NoSupervisor,
    #[error("Requester name is required")]
    MissingRequester,
    #[error("Weekly order limit reached for this school")]
    WeeklyLimitReached,
    #[error("Requested quantity for product {0} exceeds the limit of {MAX_QUANTITY_PER_PRODUCT}")]
    QuantityLimitExceeded(i64),
    #[error("Order contains no requested products")]
    EmptyOrder,
    #[error("Unknown product {0}")]
    UnknownProduct(i64),
    #[error("Order not found")]
    NotFound,
    #[error("Order already processed")]
    AlreadyProcessed,
    #[error("Insufficient stock for \"{0}\"")]
    InsufficientStock(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound => AppError::NotFound("Order"),
            OrderError::AlreadyProcessed | OrderError::InsufficientStock(_) => {
                AppError::Conflict(err.to_string())
            }
            OrderError::Database(e) => AppError::Database(e),
            OrderError::Storage(msg) => AppError::Internal(msg),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}
