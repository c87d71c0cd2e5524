use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub languages: Vec<String>,
    pub summary: Option<String>,
    /// `[{major, degree, institution}]` as extracted from the resume.
    pub education: Option<Value>,
    /// `[{role, company, duration, responsibilities}]` as extracted from the resume.
    pub experience: Option<Value>,
    pub year_of_experience: Option<f64>,
    pub profile_links: Vec<String>,
    pub created_at: DateTime<Utc>,
}
