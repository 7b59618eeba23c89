//! # HTTP Routes
//!
//! One module per resource. Each handler follows the same shape:
//!
//! ```text
//! extract (ApiJson / ApiQuery / Path)
//!     │
//!     ▼
//! validate ──► ValidationError ──► 400
//!     │
//!     ▼
//! state.db.<repo>().<op>() ──► DbError ──► ApiError (404 / 409 / 500)
//!     │
//!     ▼
//! Json(body) / (201, Json(body)) / 204
//! ```
//!
//! Sub-action routes (`/summary`, `/{id}/status`, ...) are registered before
//! the generic `/{id}` routes of the same resource.

pub mod catalogs;
pub mod categories;
pub mod clients;
pub mod health;
pub mod notifications;
pub mod products;
pub mod sales;
pub mod suppliers;

use axum::Router;
use serde::{Deserialize, Serialize};

use stockroom_core::validation::{validate_status, validate_threshold};
use stockroom_core::RecordStatus;

use crate::error::ApiResult;
use crate::AppState;

/// Routes mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(clients::router())
        .merge(catalogs::router())
        .merge(suppliers::router())
        .merge(sales::router())
        .merge(notifications::router())
}

// =============================================================================
// Shared Request/Response Bodies
// =============================================================================

/// Body of every `PUT /{resource}/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

impl StatusRequest {
    pub fn parse(&self) -> ApiResult<RecordStatus> {
        Ok(validate_status(&self.status)?)
    }
}

/// `?threshold=` for low-stock queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<i64>,
}

impl ThresholdQuery {
    /// The requested threshold, or `default` when absent.
    pub fn resolve(&self, default: i64) -> ApiResult<i64> {
        Ok(validate_threshold(self.threshold.unwrap_or(default))?)
    }
}

/// `{ "updated": n }` for bulk operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedCount {
    pub updated: u64,
}

/// `{ "count": n }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub count: i64,
}

/// Parses an optional status, defaulting to active.
pub(crate) fn status_or_active(raw: Option<&str>) -> ApiResult<RecordStatus> {
    match raw {
        Some(raw) => Ok(validate_status(raw)?),
        None => Ok(RecordStatus::Active),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures for handler tests.

    use stockroom_db::{Database, DbConfig};

    use crate::config::ApiConfig;
    use crate::AppState;

    pub async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, ApiConfig::default())
    }
}
