use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order lifecycle state. Transitions are one-directional:
/// Pending -> Approved or Pending -> Rejected, nothing after that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum OrderStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Database order model (solicitud)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub school_id: i64,
    pub requester_name: String,
    pub notes: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// One product+quantity entry within an order (detalle)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// Order line joined with its product, for the admin detail view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLineDetail {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
}

/// Order plus its lines, as returned by the admin detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLineDetail>,
}

/// Public submission payload: the school's identifying token, the person
/// asking, and the requested products.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSubmission {
    pub school_token: String,
    pub requester_name: String,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i64,
}
