//! Axum route handlers for the Job Posts API.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::applications::repository::{with_applicants, with_details};
use crate::errors::AppError;
use crate::job_posts::filters::{CandidateFilter, ExperienceLevel};
use crate::models::application::{Application, ApplicationDetail, ApplicationWithApplicant};
use crate::models::job_post::JobPost;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPostRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Job post as shown on its detail page.
#[derive(Debug, Serialize)]
pub struct JobPostDetail {
    #[serde(flatten)]
    pub job_post: JobPost,
    pub applications: Vec<ApplicationDetail>,
}

/// One row of the candidate table: application and applicant merged.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub application_id: i64,
    pub applicant_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub languages: Vec<String>,
    pub year_of_experience: Option<f64>,
    pub experience_level: Option<ExperienceLevel>,
    pub expected_salary: String,
    pub stage: String,
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl From<ApplicationWithApplicant> for Candidate {
    fn from(row: ApplicationWithApplicant) -> Self {
        let ApplicationWithApplicant {
            application,
            applicant,
        } = row;
        Candidate {
            application_id: application.id,
            applicant_id: applicant.id,
            full_name: applicant.full_name,
            email: applicant.email,
            phone: applicant.phone,
            location: applicant.location,
            summary: applicant.summary,
            languages: applicant.languages,
            year_of_experience: applicant.year_of_experience,
            experience_level: applicant.year_of_experience.map(ExperienceLevel::from_years),
            expected_salary: application.expected_salary,
            stage: application.current_stage,
            notes: application.notes,
            applied_at: application.applied_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub total: usize,
    pub candidates: Vec<Candidate>,
}

async fn find_job_post(state: &AppState, job_post_id: i64) -> Result<JobPost, AppError> {
    sqlx::query_as::<_, JobPost>("SELECT * FROM job_posts WHERE id = $1")
        .bind(job_post_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Job post not found".to_string()))
}

async fn applications_for_job(
    state: &AppState,
    job_post_id: i64,
) -> Result<Vec<Application>, AppError> {
    Ok(sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE job_post_id = $1 ORDER BY applied_at, id",
    )
    .bind(job_post_id)
    .fetch_all(&state.db)
    .await?)
}

/// GET /api/job-posts
pub async fn handle_list_job_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPost>>, AppError> {
    let posts = sqlx::query_as::<_, JobPost>("SELECT * FROM job_posts ORDER BY created_at DESC, id DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(posts))
}

/// POST /api/job-posts
pub async fn handle_create_job_post(
    State(state): State<AppState>,
    body: Result<Json<CreateJobPostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobPost>), AppError> {
    let Json(request) = body?;
    let title = request.title.trim();
    let description = request.description.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if description.is_empty() {
        return Err(AppError::Validation("description cannot be empty".to_string()));
    }

    let required_skills: Vec<String> = request
        .required_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let post = sqlx::query_as::<_, JobPost>(
        r#"
        INSERT INTO job_posts (title, description, location, employment_type, required_skills, status)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'OPEN'))
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(&request.location)
    .bind(&request.employment_type)
    .bind(&required_skills)
    .bind(request.status.as_deref().map(str::to_uppercase))
    .fetch_one(&state.db)
    .await?;

    info!("Created job post {} ({})", post.id, post.title);
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/job-posts/:id
///
/// The job post with every application, applicant, document and stage move.
pub async fn handle_get_job_post(
    State(state): State<AppState>,
    Path(job_post_id): Path<i64>,
) -> Result<Json<JobPostDetail>, AppError> {
    let job_post = find_job_post(&state, job_post_id).await?;
    let applications = applications_for_job(&state, job_post_id).await?;

    let mut conn = state.db.acquire().await?;
    let applications = with_details(&mut conn, applications).await?;

    Ok(Json(JobPostDetail {
        job_post,
        applications,
    }))
}

/// GET /api/job-posts/:id/candidates
///
/// Candidates of a job post narrowed by the pipeline-view filters.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_post_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let filter = CandidateFilter::from_params(&params).map_err(AppError::Validation)?;

    find_job_post(&state, job_post_id).await?;
    let applications = applications_for_job(&state, job_post_id).await?;

    let mut conn = state.db.acquire().await?;
    let mut rows = with_applicants(&mut conn, applications).await?;
    if filter.is_active() {
        let before = rows.len();
        rows.retain(|row| filter.matches(&row.application, &row.applicant));
        debug!(
            "Candidate filter kept {} of {before} applications for job post {job_post_id}",
            rows.len()
        );
    }
    let candidates: Vec<Candidate> = rows.into_iter().map(Candidate::from).collect();

    Ok(Json(CandidateListResponse {
        total: candidates.len(),
        candidates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::applicant::Applicant;

    #[test]
    fn test_candidate_merges_application_and_applicant() {
        let row = ApplicationWithApplicant {
            application: Application {
                id: 5,
                job_post_id: 1,
                applicant_id: 9,
                current_stage: "AI_SCREENING".to_string(),
                expected_salary: "10000".to_string(),
                notes: Some("referral".to_string()),
                applied_at: Utc::now(),
            },
            applicant: Applicant {
                id: 9,
                full_name: "Sari".to_string(),
                email: "sari@example.com".to_string(),
                phone: Some("0812".to_string()),
                location: None,
                languages: vec![],
                summary: None,
                education: None,
                experience: None,
                year_of_experience: Some(3.5),
                profile_links: vec![],
                created_at: Utc::now(),
            },
        };

        let value = serde_json::to_value(Candidate::from(row)).unwrap();
        assert_eq!(value["applicationId"], 5);
        assert_eq!(value["fullName"], "Sari");
        assert_eq!(value["stage"], "AI_SCREENING");
        assert_eq!(value["experienceLevel"], "mid");
    }

    #[test]
    fn test_create_request_defaults_optional_fields() {
        let req: CreateJobPostRequest =
            serde_json::from_str(r#"{"title": "Go Engineer", "description": "Build APIs"}"#)
                .unwrap();
        assert!(req.required_skills.is_empty());
        assert!(req.location.is_none());
        assert!(req.status.is_none());
    }

    mod endpoint {
        use axum::http::StatusCode;
        use sqlx::PgPool;

        use crate::routes::build_router;
        use crate::test_support::{
            get, insert_applicant, insert_application, insert_job_post, s3_client, send,
            test_state, StubAnalyst,
        };

        async fn candidates(pool: &PgPool, uri: &str) -> (StatusCode, serde_json::Value) {
            let router = build_router(test_state(
                pool.clone(),
                StubAnalyst::default(),
                s3_client(None),
                &std::env::temp_dir(),
            ));
            send(router, get(uri)).await
        }

        fn names(body: &serde_json::Value) -> Vec<&str> {
            body["candidates"]
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["fullName"].as_str().unwrap())
                .collect()
        }

        #[sqlx::test]
        async fn test_candidates_are_filtered_per_job(pool: PgPool) {
            let job = insert_job_post(&pool, "Rust Engineer", "Rust").await;
            let other_job = insert_job_post(&pool, "Go Engineer", "Go").await;

            let senior = insert_applicant(&pool, "Budi Santoso", "budi@example.com", Some("Jakarta"), Some(6.0)).await;
            let junior = insert_applicant(&pool, "Ana Lima", "ana@example.com", Some("Berlin"), Some(1.5)).await;
            let elsewhere = insert_applicant(&pool, "Chen Wei", "chen@example.com", Some("Jakarta"), Some(9.0)).await;

            insert_application(&pool, job, senior, "REVIEW", "Rp 20.000.000").await;
            insert_application(&pool, job, junior, "APPLIED", "Rp 8.000.000").await;
            insert_application(&pool, other_job, elsewhere, "REVIEW", "Rp 30.000.000").await;

            let uri = format!("/api/job-posts/{job}/candidates");

            let (status, body) = candidates(&pool, &uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["total"], 2);

            let (_, body) = candidates(&pool, &format!("{uri}?experience_level=senior")).await;
            assert_eq!(names(&body), vec!["Budi Santoso"]);

            let (_, body) = candidates(&pool, &format!("{uri}?location=berl")).await;
            assert_eq!(names(&body), vec!["Ana Lima"]);

            let (_, body) = candidates(&pool, &format!("{uri}?stage=review&max_salary=25000000")).await;
            assert_eq!(names(&body), vec!["Budi Santoso"]);

            let (_, body) = candidates(&pool, &format!("{uri}?min_experience=10")).await;
            assert_eq!(body["total"], 0);
        }

        #[sqlx::test]
        async fn test_candidates_of_unknown_job_is_not_found(pool: PgPool) {
            let (status, body) = candidates(&pool, "/api/job-posts/4242/candidates").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["message"], "Job post not found");
        }
    }
}
