use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Supervisor–school association. Pair-unique. Exactly one assignment per
/// school carries the primary flag and receives that school's orders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub supervisor_id: i64,
    pub school_id: i64,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentInput {
    pub supervisor_id: i64,
    pub school_id: i64,
}
