//! Axum route handlers for the Applications API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::analyst::profile::ResumeProfile;
use crate::applications::repository::{
    find_applicant_by_email, find_application, find_document, insert_stage_history,
    with_applicants, with_details,
};
use crate::applications::validation::{
    CreateApplicationRequest, NewApplication, StageChangeRequest,
};
use crate::db::{is_serialization_failure, is_unique_violation};
use crate::errors::AppError;
use crate::models::applicant::Applicant;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationWithApplicant, Stage,
};
use crate::state::AppState;

pub const DUPLICATE_APPLICATION: &str = "You have already applied for this job";
const APPLICATION_UNIQUE_CONSTRAINT: &str = "applications_applicant_job_key";
const APPLICANT_EMAIL_CONSTRAINT: &str = "applicants_email_key";
const CREATE_ATTEMPTS: u32 = 3;
const CREATE_STATEMENT_TIMEOUT: &str = "30s";

/// GET /api/applications
///
/// All applications, each with its applicant.
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationWithApplicant>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let applications =
        sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY applied_at DESC, id DESC")
            .fetch_all(&mut *conn)
            .await?;
    Ok(Json(with_applicants(&mut conn, applications).await?))
}

/// POST /api/applications
///
/// Reads the first document's extracted text into a structured profile for new
/// applicants, then creates applicant, application, document links and the
/// first stage history row in one serializable transaction.
pub async fn handle_create_application(
    State(state): State<AppState>,
    body: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplicationDetail>), AppError> {
    let Json(request) = body?;
    let application = request.validate().map_err(AppError::InvalidFields)?;

    let profile = extract_profile_for_new_applicant(&state, &application).await?;
    let detail = create_application_with_retry(&state.db, &application, &profile).await?;

    info!(
        "Created application {} for applicant {} on job post {}",
        detail.application.id, detail.applicant.id, detail.application.job_post_id
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Runs resume extraction only when the applicant is unknown and the resume has text.
async fn extract_profile_for_new_applicant(
    state: &AppState,
    application: &NewApplication,
) -> Result<ResumeProfile, AppError> {
    let mut conn = state.db.acquire().await?;

    let first_document_id = application.document_ids[0];
    let document = find_document(&mut conn, first_document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {first_document_id} not found")))?;

    if find_applicant_by_email(&mut conn, &application.email)
        .await?
        .is_some()
    {
        return Ok(ResumeProfile::default());
    }
    drop(conn);

    match document.local_path.as_deref() {
        Some(path) => {
            let resume_text = state.text_store.load(path).await?;
            state.analyst.extract_profile(&resume_text).await
        }
        None => Ok(ResumeProfile::default()),
    }
}

async fn begin_serializable(pool: &PgPool) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "SET LOCAL statement_timeout = '{CREATE_STATEMENT_TIMEOUT}'"
    ))
    .execute(&mut *tx)
    .await?;
    Ok(tx)
}

/// A concurrent request that wrote the same applicant or application first.
/// Postgres reports it as a serialization failure or, for the applicant row,
/// as a unique violation; either way a fresh attempt sees the committed rows.
fn is_write_conflict(err: &sqlx::Error) -> bool {
    is_serialization_failure(err) || is_unique_violation(err, APPLICANT_EMAIL_CONSTRAINT)
}

async fn create_application_with_retry(
    pool: &PgPool,
    new: &NewApplication,
    profile: &ResumeProfile,
) -> Result<ApplicationDetail, AppError> {
    let mut attempt = 1;
    loop {
        match create_application(pool, new, profile).await {
            Err(AppError::Database(e)) if is_write_conflict(&e) => {
                if attempt >= CREATE_ATTEMPTS {
                    warn!(
                        "Giving up on application for {} to job post {} after {attempt} write conflicts: {e}",
                        new.email, new.job_post_id
                    );
                    return Err(AppError::Conflict(DUPLICATE_APPLICATION.to_string()));
                }
                warn!(
                    "Write conflict creating application for {} (attempt {attempt}), retrying",
                    new.email
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn create_application(
    pool: &PgPool,
    new: &NewApplication,
    profile: &ResumeProfile,
) -> Result<ApplicationDetail, AppError> {
    let mut tx = begin_serializable(pool).await?;

    let job_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM job_posts WHERE id = $1")
        .bind(new.job_post_id)
        .fetch_optional(&mut *tx)
        .await?;
    if job_exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Job post {} not found",
            new.job_post_id
        )));
    }

    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM documents WHERE id = ANY($1)")
        .bind(&new.document_ids)
        .fetch_all(&mut *tx)
        .await?;
    let missing: Vec<String> = new
        .document_ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::NotFound(format!(
            "Documents not found: {}",
            missing.join(", ")
        )));
    }

    let applicant = match find_applicant_by_email(&mut tx, &new.email).await? {
        Some(existing) => existing,
        None => insert_applicant(&mut tx, new, profile).await?,
    };

    let duplicate: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM applications WHERE applicant_id = $1 AND job_post_id = $2",
    )
    .bind(applicant.id)
    .bind(new.job_post_id)
    .fetch_optional(&mut *tx)
    .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(DUPLICATE_APPLICATION.to_string()));
    }

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (job_post_id, applicant_id, current_stage, expected_salary, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new.job_post_id)
    .bind(applicant.id)
    .bind(Stage::Applied.as_str())
    .bind(&new.expected_salary)
    .bind(&new.notes)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e, APPLICATION_UNIQUE_CONSTRAINT) {
            AppError::Conflict(DUPLICATE_APPLICATION.to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    sqlx::query(
        r#"
        INSERT INTO application_documents (application_id, document_id)
        SELECT $1, UNNEST($2::bigint[])
        "#,
    )
    .bind(application.id)
    .bind(&new.document_ids)
    .execute(&mut *tx)
    .await?;

    insert_stage_history(
        &mut tx,
        application.id,
        Stage::Applied,
        Some("Application submitted"),
        None,
    )
    .await?;

    let detail = with_details(&mut tx, vec![application])
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("Failed to load the created application"))?;

    tx.commit().await?;
    Ok(detail)
}

async fn insert_applicant(
    tx: &mut Transaction<'static, Postgres>,
    new: &NewApplication,
    profile: &ResumeProfile,
) -> Result<Applicant, AppError> {
    let applicant = sqlx::query_as::<_, Applicant>(
        r#"
        INSERT INTO applicants
            (full_name, email, phone, location, languages, summary,
             education, experience, year_of_experience, profile_links)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(&new.full_name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&profile.location)
    .bind(&profile.languages)
    .bind(&profile.summary)
    .bind(profile.education_json())
    .bind(profile.experience_json())
    .bind(profile.year_of_experience)
    .bind(&profile.profile_links)
    .fetch_one(&mut **tx)
    .await?;

    info!("Created applicant {} ({})", applicant.id, applicant.email);
    Ok(applicant)
}

/// PATCH /api/applications/:id/stage
///
/// Moves an application to another stage and records the move.
pub async fn handle_change_stage(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
    body: Result<Json<StageChangeRequest>, JsonRejection>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let Json(request) = body?;
    let stage = request.stage()?;
    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let mut tx = state.db.begin().await?;

    let application = sqlx::query_as::<_, Application>(
        "UPDATE applications SET current_stage = $1 WHERE id = $2 RETURNING *",
    )
    .bind(stage.as_str())
    .bind(application_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    insert_stage_history(&mut tx, application.id, stage, notes, request.changed_by).await?;

    let detail = with_details(&mut tx, vec![application])
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("Failed to reload application {application_id}"))?;

    tx.commit().await?;

    info!("Application {application_id} moved to {stage}");
    Ok(Json(detail))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let mut conn = state.db.acquire().await?;
    let application = find_application(&mut conn, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let detail = with_details(&mut conn, vec![application])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    Ok(Json(detail))
}
