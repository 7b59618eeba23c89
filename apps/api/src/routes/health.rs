//! Health check for monitoring and load balancers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub migrations_applied: usize,
    pub migrations_total: usize,
}

/// `GET /health`: 200 with migration counts, 503 when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if !state.db.health_check().await {
        warn!("Health check failed: database unreachable");
        return Err(ApiError::unavailable("Database unreachable"));
    }

    let migrations = state.db.migration_status().await.map_err(|e| {
        warn!(error = %e, "Health check failed: migration status");
        ApiError::unavailable("Database unreachable")
    })?;

    Ok(Json(HealthResponse {
        status: "ok",
        database: "connected",
        migrations_applied: migrations.applied,
        migrations_total: migrations.total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_healthy() {
        let state = test_state().await;

        let Json(body) = health(State(state)).await.unwrap();
        assert_eq!(body.status, "ok");
        assert!(body.migrations_total >= 1);
        assert_eq!(body.migrations_applied, body.migrations_total);
    }

    #[tokio::test]
    async fn test_unreachable_database() {
        let state = test_state().await;
        state.db.close().await;

        let err = health(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
