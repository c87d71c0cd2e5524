//! Resume analysis, the AI-backed half of the screening pipeline.
//!
//! `AppState` holds an `Arc<dyn ResumeAnalyst>`; `GeminiAnalyst` is the production backend.

pub mod evaluation;
pub mod profile;
pub mod prompts;

use async_trait::async_trait;
use tracing::warn;

use crate::analyst::evaluation::{build_screening_prompt, screening_schema, Screening, ScreeningInput};
use crate::analyst::profile::{build_profile_prompt, profile_schema, ResumeProfile};
use crate::analyst::prompts::{PROFILE_EXTRACT_SYSTEM, SCREENING_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::{GenerationOptions, LlmClient, LlmError};

/// The analysis seam used by handlers. Implement it to swap the model backend.
#[async_trait]
pub trait ResumeAnalyst: Send + Sync {
    /// Reads a structured profile off resume text.
    /// An unusable model answer yields an empty profile rather than an error.
    async fn extract_profile(&self, resume_text: &str) -> Result<ResumeProfile, AppError>;

    /// Scores a resume against a job description. `None` when the model gave no answer.
    async fn screen(&self, input: ScreeningInput<'_>) -> Result<Option<Screening>, AppError>;
}

/// Gemini-backed analyst.
pub struct GeminiAnalyst {
    llm: LlmClient,
}

impl GeminiAnalyst {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

fn system_prompt(role: &str) -> String {
    format!("{role} {NO_INVENTION_INSTRUCTION} {JSON_ONLY_SYSTEM}")
}

#[async_trait]
impl ResumeAnalyst for GeminiAnalyst {
    async fn extract_profile(&self, resume_text: &str) -> Result<ResumeProfile, AppError> {
        let schema = profile_schema();
        let result = self
            .llm
            .call_json::<ResumeProfile>(
                &build_profile_prompt(resume_text),
                &system_prompt(PROFILE_EXTRACT_SYSTEM),
                GenerationOptions {
                    response_schema: &schema,
                    temperature: None,
                },
            )
            .await;

        match result {
            Ok(profile) => Ok(profile),
            Err(e @ (LlmError::Parse(_) | LlmError::EmptyContent)) => {
                warn!("Discarding unusable resume profile answer: {e}");
                Ok(ResumeProfile::default())
            }
            Err(e) => Err(AppError::Llm(format!("Resume profile extraction failed: {e}"))),
        }
    }

    async fn screen(&self, input: ScreeningInput<'_>) -> Result<Option<Screening>, AppError> {
        let schema = screening_schema();
        let result = self
            .llm
            .call_json::<Screening>(
                &build_screening_prompt(&input),
                &system_prompt(SCREENING_SYSTEM),
                GenerationOptions {
                    response_schema: &schema,
                    temperature: Some(0.0),
                },
            )
            .await;

        match result {
            Ok(screening) => Ok(Some(screening.normalized())),
            Err(LlmError::EmptyContent) => Ok(None),
            Err(e) => Err(AppError::Llm(format!("Screening failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    fn analyst_for(server: &MockServer) -> GeminiAnalyst {
        GeminiAnalyst::new(LlmClient::new("test-key".to_string()).with_base_url(server.base_url()))
    }

    fn answer(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[tokio::test]
    async fn test_extract_profile_parses_answer() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_contains("Rust developer in Berlin");
            then.status(200).json_body(answer(
                r#"{"location": "Berlin", "languages": ["German"], "yearOfExperience": 7}"#,
            ));
        });

        let profile = analyst_for(&server)
            .extract_profile("Rust developer in Berlin")
            .await
            .unwrap();
        assert_eq!(profile.location.as_deref(), Some("Berlin"));
        assert_eq!(profile.year_of_experience, Some(7.0));
    }

    #[tokio::test]
    async fn test_extract_profile_falls_back_to_empty_profile() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(answer("this is not json"));
        });

        let profile = analyst_for(&server).extract_profile("cv").await.unwrap();
        assert_eq!(profile, ResumeProfile::default());
    }

    #[tokio::test]
    async fn test_extract_profile_surfaces_api_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(403)
                .json_body(json!({ "error": { "message": "permission denied" } }));
        });

        let err = analyst_for(&server).extract_profile("cv").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(msg) if msg.contains("permission denied")));
    }

    #[tokio::test]
    async fn test_screen_runs_deterministically_and_normalizes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .json_body_partial(r#"{"generationConfig": {"temperature": 0.0}}"#);
            then.status(200).json_body(answer(
                r#"{"matchPercentage": 120, "accurateKeywords": ["Go"], "missingKeywords": ["go", "gRPC"]}"#,
            ));
        });

        let custom = Value::Null;
        let screening = analyst_for(&server)
            .screen(ScreeningInput {
                job_description: "Go engineer",
                resume_text: "Go developer",
                custom_requirement: &custom,
            })
            .await
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(screening.match_percentage, Some(100.0));
        assert_eq!(screening.missing_keywords, vec!["gRPC"]);
    }

    #[tokio::test]
    async fn test_screen_without_answer_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        });

        let custom = Value::Null;
        let screening = analyst_for(&server)
            .screen(ScreeningInput {
                job_description: "jd",
                resume_text: "cv",
                custom_requirement: &custom,
            })
            .await
            .unwrap();
        assert!(screening.is_none());
    }
}
