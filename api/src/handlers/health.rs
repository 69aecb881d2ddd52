use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Health check endpoint
///
/// Answers `service_unavailable` (503) while the database is unreachable.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ErrorResponse> {
    match state.books.ping().await {
        Ok(()) => Ok(Json(json!({ "status": "ok", "database": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            Err(ErrorResponse::new(
                "service_unavailable",
                format!("Database is unavailable: {}", e),
            ))
        }
    }
}
