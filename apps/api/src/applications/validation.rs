//! Request bodies for the Applications API and their validation rules.

use serde::Deserialize;

use crate::errors::{AppError, FieldError};
use crate::models::application::Stage;

/// Body of `POST /api/applications`. Every field is optional at the serde level
/// so that missing fields surface as validation errors rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateApplicationRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_post_id: Option<i64>,
    pub expected_salary: Option<String>,
    pub notes: Option<String>,
    pub document_ids: Option<Vec<i64>>,
}

/// A create request that passed validation. Strings are trimmed, the email is
/// lower-cased and document ids are de-duplicated in order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_post_id: i64,
    pub expected_salary: String,
    pub notes: Option<String>,
    pub document_ids: Vec<i64>,
}

impl CreateApplicationRequest {
    pub fn validate(self) -> Result<NewApplication, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut reject = |field, message| errors.push(FieldError { field, message });

        let full_name = non_blank(self.full_name);
        if full_name.is_none() {
            reject("fullName", "is required");
        }

        let email = non_blank(self.email).map(|e| e.to_lowercase());
        match &email {
            None => reject("email", "is required"),
            Some(e) if !is_plausible_email(e) => reject("email", "must be a valid email address"),
            Some(_) => {}
        }

        let phone = non_blank(self.phone);
        if let Some(p) = &phone {
            if !p.chars().any(|c| c.is_ascii_digit())
                || !p
                    .chars()
                    .all(|c| c.is_ascii_digit() || " +-().".contains(c))
            {
                reject("phone", "must be a phone number");
            }
        }

        match self.job_post_id {
            None => reject("jobPostId", "is required"),
            Some(id) if id <= 0 => reject("jobPostId", "must be a positive id"),
            Some(_) => {}
        }

        let expected_salary = non_blank(self.expected_salary);
        if expected_salary.is_none() {
            reject("expectedSalary", "is required");
        }

        let mut document_ids = Vec::new();
        for id in self.document_ids.unwrap_or_default() {
            if !document_ids.contains(&id) {
                document_ids.push(id);
            }
        }
        if document_ids.is_empty() {
            reject("documentIds", "at least one document is required");
        } else if document_ids.iter().any(|id| *id <= 0) {
            reject("documentIds", "must contain positive ids");
        }

        match (full_name, email, self.job_post_id, expected_salary) {
            (Some(full_name), Some(email), Some(job_post_id), Some(expected_salary))
                if errors.is_empty() =>
            {
                Ok(NewApplication {
                    full_name,
                    email,
                    phone,
                    job_post_id,
                    expected_salary,
                    notes: non_blank(self.notes),
                    document_ids,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Body of `PATCH /api/applications/:id/stage`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeRequest {
    pub stage: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub changed_by: Option<i64>,
}

impl StageChangeRequest {
    pub fn stage(&self) -> Result<Stage, AppError> {
        self.stage.parse::<Stage>().map_err(AppError::Validation)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
