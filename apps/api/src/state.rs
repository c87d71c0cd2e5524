use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::analyst::ResumeAnalyst;
use crate::config::Config;
use crate::documents::storage::TextStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Resume analysis backend. Default: `GeminiAnalyst`.
    pub analyst: Arc<dyn ResumeAnalyst>,
    pub text_store: TextStore,
    pub config: Config,
}
