//! # Stockroom API
//!
//! HTTP/JSON back office for inventory and sales.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Client ──► axum Router (/api) ──► handler ──► Database::<repo>() ──►  │
//! │                 │                     │                    SQLite      │
//! │             TraceLayer           ApiError                              │
//! │          (request logs)     (status + JSON envelope)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary (`main.rs`) loads [`config::ApiConfig`], opens the
//! [`Database`] and serves [`build_router`].

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use stockroom_db::Database;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Cheap to clone: the pool and config are reference-counted.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the application router with every route under `/api`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
