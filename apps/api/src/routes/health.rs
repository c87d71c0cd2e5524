use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::state::AppState;

/// GET /health
/// Reports service status after a database round trip.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": Utc::now().to_rfc3339(),
                "database": "connected",
                "version": env!("CARGO_PKG_VERSION"),
                "service": "hiring-api"
            })),
        ),
        Err(e) => {
            error!("Health check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": Utc::now().to_rfc3339(),
                    "database": "disconnected",
                    "error": "Database connection failed"
                })),
            )
        }
    }
}
