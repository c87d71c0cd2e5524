//! Axum route handlers for the Documents API.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::documents::extract::{
    content_type_for, extract_text, file_type, split_file_name, TextFormat,
};
use crate::documents::storage::{object_key, upload_object};
use crate::errors::AppError;
use crate::models::conversation::Chat;
use crate::models::document::Document;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: Option<i64>,
    #[serde(alias = "difyConversationId")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadError {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub data: Vec<Document>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<UploadError>,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub data: Vec<Document>,
}

/// One file part pulled out of the multipart body.
struct IncomingFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Outcome of a batch upload: status and message by how many files failed.
pub fn upload_outcome(uploaded: usize, failed: usize) -> (StatusCode, &'static str) {
    match (uploaded, failed) {
        (0, f) if f > 0 => (StatusCode::INTERNAL_SERVER_ERROR, "All file uploads failed"),
        (_, f) if f > 0 => (StatusCode::MULTI_STATUS, "Some files failed to upload"),
        _ => (StatusCode::OK, "Files uploaded successfully"),
    }
}

/// POST /api/documents
///
/// Accepts repeated `files` parts. Each file is processed on its own;
/// failures are reported per file and do not abort the batch.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file part: {e}")))?;
        files.push(IncomingFile {
            file_name,
            content_type,
            bytes,
        });
    }

    if files.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()));
    }

    let mut uploaded = Vec::new();
    let mut errors = Vec::new();

    for file in files {
        if file.file_name.is_empty() || file.bytes.is_empty() {
            continue;
        }
        let file_name = file.file_name.clone();
        match store_document(&state, owner.user_id, file).await {
            Ok(document) => uploaded.push(document),
            Err(e) => {
                warn!("Error processing file {file_name}: {e}");
                errors.push(UploadError {
                    file_name,
                    error: e.public_message(),
                });
            }
        }
    }

    let (status, message) = upload_outcome(uploaded.len(), errors.len());
    info!(
        "Document upload finished: {} stored, {} failed",
        uploaded.len(),
        errors.len()
    );

    if uploaded.is_empty() && !errors.is_empty() {
        let body = Json(json!({
            "error": {
                "code": "UPLOAD_FAILED",
                "message": message,
                "details": errors,
            }
        }));
        return Ok((status, body).into_response());
    }

    Ok((
        status,
        Json(UploadResponse {
            message,
            data: uploaded,
            errors,
        }),
    )
        .into_response())
}

/// Extracts text (when supported), uploads the original and records the document.
async fn store_document(
    state: &AppState,
    owner_id: Option<i64>,
    file: IncomingFile,
) -> Result<Document, AppError> {
    let IncomingFile {
        file_name,
        content_type,
        bytes,
    } = file;
    let (stem, extension) = split_file_name(&file_name);

    let local_path = match TextFormat::from_extension(extension) {
        Some(format) => {
            let text = extract_text(bytes.clone(), format).await?;
            Some(state.text_store.save(stem, &text).await?)
        }
        None => None,
    };

    let key = object_key(owner_id, stem, extension);
    let new_document = NewDocument {
        owner_id,
        file_name: &file_name,
        file_path: state.config.object_url(&key),
        file_size: bytes.len() as i64,
        file_type: file_type(extension, content_type.as_deref()),
        local_path: local_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
    };
    let content_type = content_type.unwrap_or_else(|| content_type_for(extension).to_string());

    let recorded = upload_and_record(state, &key, bytes, &content_type, new_document).await;
    if recorded.is_err() {
        if let Some(path) = &local_path {
            state.text_store.discard(path).await;
        }
    }
    recorded
}

struct NewDocument<'a> {
    owner_id: Option<i64>,
    file_name: &'a str,
    file_path: String,
    file_size: i64,
    file_type: String,
    local_path: Option<String>,
}

async fn upload_and_record(
    state: &AppState,
    key: &str,
    bytes: Bytes,
    content_type: &str,
    document: NewDocument<'_>,
) -> Result<Document, AppError> {
    upload_object(&state.s3, &state.config.s3_bucket, key, bytes, content_type).await?;

    let document = sqlx::query_as::<_, Document>(
        r#"
        INSERT INTO documents (owner_id, file_name, file_path, file_size, file_type, local_path)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(document.owner_id)
    .bind(document.file_name)
    .bind(document.file_path)
    .bind(document.file_size)
    .bind(document.file_type)
    .bind(document.local_path)
    .fetch_one(&state.db)
    .await?;

    Ok(document)
}

/// GET /api/documents?conversation_id=…&user_id=…
///
/// Documents attached to a conversation thread, limited to those the user owns.
pub async fn handle_list_conversation_documents(
    State(state): State<AppState>,
    Query(params): Query<ConversationQuery>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let user_id = params.user_id.ok_or(AppError::Unauthorized)?;
    let conversation_id = params
        .conversation_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("conversation_id is required".to_string()))?;

    let chat = sqlx::query_as::<_, Chat>(
        r#"
        SELECT c.*
        FROM chats c
        JOIN contexts x ON x.id = c.context_id
        WHERE c.dify_conversation_id = $1 AND x.user_id = $2
        ORDER BY c.id
        LIMIT 1
        "#,
    )
    .bind(&conversation_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

    let data = sqlx::query_as::<_, Document>(
        r#"
        SELECT d.*
        FROM context_documents cd
        JOIN documents d ON d.id = cd.document_id
        WHERE cd.context_id = $1 AND d.owner_id = $2
        ORDER BY d.id
        "#,
    )
    .bind(chat.context_id)
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DocumentListResponse { data }))
}
