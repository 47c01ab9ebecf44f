use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog product. Stock is mutated only by order approval and the
/// explicit stock-edit operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub quantity: i64,
}
