//! Where uploaded documents live: originals in S3, extracted text on local disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Local store for text extracted from resumes. Paths are kept on document rows.
#[derive(Debug, Clone)]
pub struct TextStore {
    root: PathBuf,
}

impl TextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `text` to `<millis>-<short id>-<stem>.txt` and returns the path.
    pub async fn save(&self, stem: &str, text: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;

        let file_name = format!(
            "{}-{}-{}.txt",
            chrono::Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            sanitize(stem)
        );
        let path = self.root.join(file_name);
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub async fn load(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read extracted text at {path}"))
    }

    /// Best-effort removal of a text file whose document was never recorded.
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove orphaned text {}: {e}", path.display());
        }
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn sanitize(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Object key for an uploaded original: `documents/<owner|anonymous>/<uuid>-<stem>[.<ext>]`.
pub fn object_key(owner_id: Option<i64>, stem: &str, extension: Option<&str>) -> String {
    let owner = owner_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    let mut key = format!("documents/{owner}/{}-{}", Uuid::new_v4(), sanitize(stem));
    if let Some(ext) = extension {
        key.push('.');
        key.push_str(&ext.to_ascii_lowercase());
    }
    key
}

/// Uploads an original file to the document bucket.
pub async fn upload_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload of {key} failed: {e}")))?;

    info!("Uploaded document to s3://{}/{}", bucket, key);
    Ok(())
}
