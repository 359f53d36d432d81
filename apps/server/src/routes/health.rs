//! Liveness and database check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tavola_db::migrations::migration_status;
use tracing::warn;

use crate::state::AppState;

/// `GET /health`
///
/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db.health_check().await;

    let migrations = match migration_status(state.db.pool()).await {
        Ok((total, applied)) => json!({ "total": total, "applied": applied }),
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            serde_json::Value::Null
        }
    };

    let sessions = state.sessions.len().unwrap_or(0);

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "migrations": migrations,
            "openSessions": sessions,
        })),
    )
}
