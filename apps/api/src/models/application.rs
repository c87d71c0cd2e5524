use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::applicant::Applicant;
use crate::models::document::Document;

/// Position of an application in the hiring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Applied,
    AiScreening,
    Review,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Applied,
        Stage::AiScreening,
        Stage::Review,
        Stage::Offer,
        Stage::Hired,
        Stage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Applied => "APPLIED",
            Stage::AiScreening => "AI_SCREENING",
            Stage::Review => "REVIEW",
            Stage::Offer => "OFFER",
            Stage::Hired => "HIRED",
            Stage::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    /// Accepts the stored form as well as lower-case and `ai-screening` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub job_post_id: i64,
    pub applicant_id: i64,
    pub current_stage: String,
    pub expected_salary: String,
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    pub id: i64,
    pub application_id: i64,
    pub stage: String,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub changed_by: Option<i64>,
}

/// A linked document as returned to clients: `{id, document}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDocument {
    pub id: i64,
    pub document: Document,
}

/// Application listing row: the application with its applicant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: Application,
    pub applicant: Applicant,
}

/// Full application view used by creation and the job-post detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub applicant: Applicant,
    pub documents: Vec<ApplicationDocument>,
    pub stage_history: Vec<StageHistoryEntry>,
}
