pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::documents::handlers as documents;
use crate::job_posts::handlers as job_posts;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route(
            "/api/documents",
            post(documents::handle_upload)
                .get(documents::handle_list_conversation_documents)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Applications
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/applications/:id/stage",
            patch(applications::handle_change_stage),
        )
        // Job posts
        .route(
            "/api/job-posts",
            get(job_posts::handle_list_job_posts).post(job_posts::handle_create_job_post),
        )
        .route("/api/job-posts/:id", get(job_posts::handle_get_job_post))
        .route(
            "/api/job-posts/:id/candidates",
            get(job_posts::handle_list_candidates),
        )
        .route(
            "/api/job-posts/:id/screening",
            post(screening::handle_screening),
        )
        .with_state(state)
}
