//! Text extraction from uploaded files.

use anyhow::{Context, Result};
use bytes::Bytes;

/// Formats we can turn into plain text for the analyst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Pdf,
    Plain,
}

impl TextFormat {
    pub fn from_extension(extension: Option<&str>) -> Option<Self> {
        match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("pdf") => Some(TextFormat::Pdf),
            Some("txt") | Some("md") => Some(TextFormat::Plain),
            _ => None,
        }
    }
}

/// Splits an upload name into the part before the first `.` and the part after the last `.`.
/// `resume.final.pdf` → (`resume`, `pdf`); `README` → (`README`, None).
pub fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty());
    (stem, extension)
}

/// Stored `file_type`: the extension, else the MIME subtype, else `pdf`.
pub fn file_type(extension: Option<&str>, content_type: Option<&str>) -> String {
    extension
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            content_type
                .and_then(|ct| ct.split('/').nth(1))
                .filter(|sub| !sub.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "pdf".to_string())
}

/// MIME type used for the stored object when the client did not send one.
pub fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Extracts the text content of a file.
/// PDF parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_text(bytes: Bytes, format: TextFormat) -> Result<String> {
    match format {
        TextFormat::Plain => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        TextFormat::Pdf => {
            let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .context("PDF extraction task failed")?
                .map_err(|e| anyhow::anyhow!("Failed to extract text from PDF: {e}"))?;
            Ok(text)
        }
    }
}
