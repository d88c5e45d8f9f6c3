use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Organisational unit (OPD): the ownership and visibility boundary for documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Opd {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
