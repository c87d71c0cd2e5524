use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A conversation thread with the recruiting assistant. Its documents hang off the context.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: i64,
    pub context_id: i64,
    pub dify_conversation_id: String,
    pub created_at: DateTime<Utc>,
}
