use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub file_name: String,
    /// Public URL of the stored original.
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    /// Local path of the extracted text, when the format is supported.
    pub local_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

