//! Fixtures shared by handler tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::{retry::RetryConfig, Credentials};
use aws_sdk_s3::Client as S3Client;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use crate::analyst::evaluation::{Screening, ScreeningInput};
use crate::analyst::profile::ResumeProfile;
use crate::analyst::ResumeAnalyst;
use crate::config::test_config;
use crate::documents::storage::TextStore;
use crate::errors::AppError;
use crate::state::AppState;

/// Analyst with canned answers.
#[derive(Debug, Clone, Default)]
pub struct StubAnalyst {
    pub profile: ResumeProfile,
    pub screening: Option<Screening>,
}

#[async_trait]
impl ResumeAnalyst for StubAnalyst {
    async fn extract_profile(&self, _resume_text: &str) -> Result<ResumeProfile, AppError> {
        Ok(self.profile.clone())
    }

    async fn screen(&self, _input: ScreeningInput<'_>) -> Result<Option<Screening>, AppError> {
        Ok(self.screening.clone())
    }
}

/// Pool that never connects; only paths rejected before any query can use it.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy(&test_config().database_url)
        .unwrap()
}

/// S3 client without retries, optionally aimed at a mock endpoint.
pub fn s3_client(endpoint: Option<&str>) -> S3Client {
    let mut builder = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "tests"))
        .retry_config(RetryConfig::disabled())
        .force_path_style(true);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    S3Client::from_conf(builder.build())
}

pub fn test_state(db: PgPool, analyst: StubAnalyst, s3: S3Client, text_root: &Path) -> AppState {
    AppState {
        db,
        s3,
        analyst: Arc::new(analyst),
        text_store: TextStore::new(text_root),
        config: test_config(),
    }
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn insert_job_post(pool: &PgPool, title: &str, description: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO job_posts (title, description) VALUES ($1, $2) RETURNING id")
        .bind(title)
        .bind(description)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn insert_document(
    pool: &PgPool,
    owner_id: Option<i64>,
    file_name: &str,
    local_path: Option<&str>,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO documents (owner_id, file_name, file_path, file_size, file_type, local_path)
        VALUES ($1, $2, $3, 128, 'pdf', $4)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(file_name)
    .bind(format!("http://cdn.local/hiring-documents/documents/{file_name}"))
    .bind(local_path)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_applicant(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    location: Option<&str>,
    year_of_experience: Option<f64>,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO applicants (full_name, email, location, year_of_experience)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(location)
    .bind(year_of_experience)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_application(
    pool: &PgPool,
    job_post_id: i64,
    applicant_id: i64,
    stage: &str,
    expected_salary: &str,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO applications (job_post_id, applicant_id, current_stage, expected_salary)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(job_post_id)
    .bind(applicant_id)
    .bind(stage)
    .bind(expected_salary)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn link_document(pool: &PgPool, application_id: i64, document_id: i64) {
    sqlx::query("INSERT INTO application_documents (application_id, document_id) VALUES ($1, $2)")
        .bind(application_id)
        .bind(document_id)
        .execute(pool)
        .await
        .unwrap();
}
