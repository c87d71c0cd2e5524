//! Axum route handler for the Screening API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analyst::evaluation::{Screening, ScreeningInput};
use crate::applications::repository::{documents_for_application, find_application};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScreeningRequest {
    pub application_id: i64,
    /// Recruiter requirements layered on top of the job description; any JSON.
    #[serde(default)]
    pub custom_requirement: Value,
}

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub success: bool,
    pub data: Option<Screening>,
}

impl ScreeningResponse {
    fn of(data: Option<Screening>) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// POST /api/job-posts/:id/screening
///
/// Scores the application's resume against the job description. Nothing is stored.
pub async fn handle_screening(
    State(state): State<AppState>,
    Path(job_post_id): Path<i64>,
    body: Result<Json<ScreeningRequest>, JsonRejection>,
) -> Result<Json<ScreeningResponse>, AppError> {
    let Json(request) = body?;
    let job_description: String =
        sqlx::query_scalar("SELECT description FROM job_posts WHERE id = $1")
            .bind(job_post_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Job post not found".to_string()))?;

    let mut conn = state.db.acquire().await?;
    let application = find_application(&mut conn, request.application_id)
        .await?
        .filter(|a| a.job_post_id == job_post_id)
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    let documents = documents_for_application(&mut conn, application.id).await?;
    drop(conn);

    let resume = documents.first().ok_or_else(|| {
        AppError::UnprocessableEntity(format!(
            "Application {} has no documents to screen",
            application.id
        ))
    })?;

    let Some(path) = resume.local_path.as_deref() else {
        info!(
            "Document {} of application {} has no extracted text; skipping screening",
            resume.id, application.id
        );
        return Ok(Json(ScreeningResponse::of(None)));
    };

    let resume_text = state.text_store.load(path).await?;
    let screening = state
        .analyst
        .screen(ScreeningInput {
            job_description: &job_description,
            resume_text: &resume_text,
            custom_requirement: &request.custom_requirement,
        })
        .await?;

    if let Some(result) = &screening {
        info!(
            "Screened application {} against job post {}: {:?}%",
            application.id, job_post_id, result.match_percentage
        );
    }

    Ok(Json(ScreeningResponse::of(screening)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_custom_requirement_to_null() {
        let req: ScreeningRequest = serde_json::from_str(r#"{"application_id": 4}"#).unwrap();
        assert_eq!(req.application_id, 4);
        assert!(req.custom_requirement.is_null());
    }

    #[test]
    fn test_request_accepts_free_form_requirement() {
        let req: ScreeningRequest = serde_json::from_str(
            r#"{"application_id": 4, "custom_requirement": "Must speak Mandarin"}"#,
        )
        .unwrap();
        assert_eq!(req.custom_requirement, "Must speak Mandarin");
    }

    #[test]
    fn test_empty_result_serializes_null_data() {
        let body = serde_json::to_value(ScreeningResponse::of(None)).unwrap();
        assert_eq!(body["success"], true);
        assert!(body["data"].is_null());
    }

    mod endpoint {
        use axum::http::{Method, StatusCode};
        use serde_json::json;
        use sqlx::PgPool;

        use crate::analyst::evaluation::Screening;
        use crate::routes::build_router;
        use crate::test_support::{
            insert_applicant, insert_application, insert_document, insert_job_post,
            json_request, link_document, s3_client, send, test_state, StubAnalyst,
        };

        fn analyst() -> StubAnalyst {
            StubAnalyst {
                screening: Some(Screening {
                    match_percentage: Some(82.0),
                    missing_keywords: vec!["Kubernetes".to_string()],
                    accurate_keywords: vec!["Rust".to_string(), "PostgreSQL".to_string()],
                    final_thoughts: Some("Strong backend profile".to_string()),
                    recommendations: None,
                }),
                ..Default::default()
            }
        }

        async fn screen(pool: &PgPool, job: i64, application_id: i64) -> (StatusCode, serde_json::Value) {
            let router = build_router(test_state(
                pool.clone(),
                analyst(),
                s3_client(None),
                &std::env::temp_dir(),
            ));
            send(
                router,
                json_request(
                    Method::POST,
                    &format!("/api/job-posts/{job}/screening"),
                    &json!({ "application_id": application_id, "custom_requirement": { "language": "Portuguese" } }),
                ),
            )
            .await
        }

        #[sqlx::test]
        async fn test_screening_returns_analyst_result(pool: PgPool) {
            let dir = tempfile::tempdir().unwrap();
            let resume = dir.path().join("resume.txt");
            std::fs::write(&resume, "Rust and PostgreSQL engineer").unwrap();

            let job = insert_job_post(&pool, "Rust Engineer", "Rust, PostgreSQL, Kubernetes").await;
            let applicant = insert_applicant(&pool, "Ana Lima", "ana@example.com", None, None).await;
            let application = insert_application(&pool, job, applicant, "APPLIED", "5000").await;
            let doc = insert_document(&pool, None, "resume.pdf", resume.to_str()).await;
            link_document(&pool, application, doc).await;

            let (status, body) = screen(&pool, job, application).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
            assert_eq!(body["data"]["matchPercentage"], 82.0);
            assert_eq!(body["data"]["accurateKeywords"], json!(["Rust", "PostgreSQL"]));
            assert_eq!(body["data"]["missingKeywords"], json!(["Kubernetes"]));
        }

        #[sqlx::test]
        async fn test_screening_without_extracted_text_returns_null(pool: PgPool) {
            let job = insert_job_post(&pool, "Rust Engineer", "Rust").await;
            let applicant = insert_applicant(&pool, "Ana Lima", "ana@example.com", None, None).await;
            let application = insert_application(&pool, job, applicant, "APPLIED", "5000").await;
            let doc = insert_document(&pool, None, "resume.docx", None).await;
            link_document(&pool, application, doc).await;

            let (status, body) = screen(&pool, job, application).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
            assert!(body["data"].is_null());
        }

        #[sqlx::test]
        async fn test_screening_without_documents_is_unprocessable(pool: PgPool) {
            let job = insert_job_post(&pool, "Rust Engineer", "Rust").await;
            let applicant = insert_applicant(&pool, "Ana Lima", "ana@example.com", None, None).await;
            let application = insert_application(&pool, job, applicant, "APPLIED", "5000").await;

            let (status, body) = screen(&pool, job, application).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        }

        #[sqlx::test]
        async fn test_screening_unknown_job_or_application_is_not_found(pool: PgPool) {
            let job = insert_job_post(&pool, "Rust Engineer", "Rust").await;
            let other_job = insert_job_post(&pool, "Go Engineer", "Go").await;
            let applicant = insert_applicant(&pool, "Ana Lima", "ana@example.com", None, None).await;
            let application = insert_application(&pool, other_job, applicant, "APPLIED", "5000").await;

            let (status, body) = screen(&pool, job + 100, application).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["message"], "Job post not found");

            let (status, body) = screen(&pool, job, application + 100).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["message"], "Application not found");

            // Belongs to another job post.
            let (status, body) = screen(&pool, job, application).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["message"], "Application not found");
        }
    }
}
