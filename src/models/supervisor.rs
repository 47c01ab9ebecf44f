use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Staff member overseeing one or more schools' orders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supervisor {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SupervisorInput {
    pub name: String,
    pub surname: String,
    pub email: String,
}
