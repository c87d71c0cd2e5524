//! SQL for applications and the records hanging off them.

use std::collections::HashMap;

use sqlx::{FromRow, PgConnection};

use crate::models::applicant::Applicant;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationDocument, ApplicationWithApplicant, Stage,
    StageHistoryEntry,
};
use crate::models::document::Document;

/// A document together with the id of the link row that attaches it to an application.
#[derive(Debug, FromRow)]
struct LinkedDocumentRow {
    link_id: i64,
    application_id: i64,
    #[sqlx(flatten)]
    document: Document,
}

pub async fn find_applicant_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<Applicant>, sqlx::Error> {
    sqlx::query_as::<_, Applicant>("SELECT * FROM applicants WHERE email = $1")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_document(
    conn: &mut PgConnection,
    document_id: i64,
) -> Result<Option<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_application(
    conn: &mut PgConnection,
    application_id: i64,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(application_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Documents linked to an application, in the order they were attached.
pub async fn documents_for_application(
    conn: &mut PgConnection,
    application_id: i64,
) -> Result<Vec<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        r#"
        SELECT d.*
        FROM application_documents ad
        JOIN documents d ON d.id = ad.document_id
        WHERE ad.application_id = $1
        ORDER BY ad.id
        "#,
    )
    .bind(application_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_stage_history(
    conn: &mut PgConnection,
    application_id: i64,
    stage: Stage,
    notes: Option<&str>,
    changed_by: Option<i64>,
) -> Result<StageHistoryEntry, sqlx::Error> {
    sqlx::query_as::<_, StageHistoryEntry>(
        r#"
        INSERT INTO application_stage_history (application_id, stage, notes, changed_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(application_id)
    .bind(stage.as_str())
    .bind(notes)
    .bind(changed_by)
    .fetch_one(&mut *conn)
    .await
}

async fn applicants_by_id(
    conn: &mut PgConnection,
    applications: &[Application],
) -> Result<HashMap<i64, Applicant>, sqlx::Error> {
    let mut ids: Vec<i64> = applications.iter().map(|a| a.applicant_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let applicants =
        sqlx::query_as::<_, Applicant>("SELECT * FROM applicants WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
    Ok(applicants.into_iter().map(|a| (a.id, a)).collect())
}

/// Pairs each application with its applicant.
pub async fn with_applicants(
    conn: &mut PgConnection,
    applications: Vec<Application>,
) -> Result<Vec<ApplicationWithApplicant>, sqlx::Error> {
    let applicants = applicants_by_id(conn, &applications).await?;
    Ok(applications
        .into_iter()
        .filter_map(|application| {
            let applicant = applicants.get(&application.applicant_id)?.clone();
            Some(ApplicationWithApplicant {
                application,
                applicant,
            })
        })
        .collect())
}

/// Loads applicant, documents and stage history for each application, three queries in total.
pub async fn with_details(
    conn: &mut PgConnection,
    applications: Vec<Application>,
) -> Result<Vec<ApplicationDetail>, sqlx::Error> {
    if applications.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = applications.iter().map(|a| a.id).collect();
    let applicants = applicants_by_id(conn, &applications).await?;

    let linked = sqlx::query_as::<_, LinkedDocumentRow>(
        r#"
        SELECT ad.id AS link_id, ad.application_id, d.*
        FROM application_documents ad
        JOIN documents d ON d.id = ad.document_id
        WHERE ad.application_id = ANY($1)
        ORDER BY ad.id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let history = sqlx::query_as::<_, StageHistoryEntry>(
        r#"
        SELECT * FROM application_stage_history
        WHERE application_id = ANY($1)
        ORDER BY changed_at, id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut documents: HashMap<i64, Vec<ApplicationDocument>> = HashMap::new();
    for row in linked {
        documents
            .entry(row.application_id)
            .or_default()
            .push(ApplicationDocument {
                id: row.link_id,
                document: row.document,
            });
    }

    let mut stage_history: HashMap<i64, Vec<StageHistoryEntry>> = HashMap::new();
    for entry in history {
        stage_history
            .entry(entry.application_id)
            .or_default()
            .push(entry);
    }

    Ok(applications
        .into_iter()
        .filter_map(|application| {
            let applicant = applicants.get(&application.applicant_id)?.clone();
            Some(ApplicationDetail {
                documents: documents.remove(&application.id).unwrap_or_default(),
                stage_history: stage_history.remove(&application.id).unwrap_or_default(),
                application,
                applicant,
            })
        })
        .collect())
}
