//! # Category Routes
//!
//! ```text
//! GET    /categories                  list
//! POST   /categories                  create
//! GET    /categories/summary          product count, stock, inventory value
//! GET    /categories/{id}/products    products in the category
//! PUT    /categories/{id}/status      change status
//! PUT    /categories/{id}/prices      bulk +p% on sale prices
//! POST   /categories/{id}/merge       move products to target, delete source
//! GET    /categories/{id}             get
//! PUT    /categories/{id}             partial update
//! DELETE /categories/{id}             delete (409 while products reference it)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stockroom_core::validation::{validate_name, validate_price_increase};
use stockroom_core::{Category, CategoryId, CategorySummary, Product};

use crate::error::{ApiJson, ApiResult};
use crate::routes::{status_or_active, StatusRequest, UpdatedCount};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list).post(create))
        .route("/categories/summary", get(summary))
        .route("/categories/{id}/products", get(products))
        .route("/categories/{id}/status", put(set_status))
        .route("/categories/{id}/prices", put(increase_prices))
        .route("/categories/{id}/merge", post(merge))
        .route("/categories/{id}", get(get_one).put(update).delete(delete))
}

// =============================================================================
// Bodies
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceIncreaseRequest {
    pub percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeResponse {
    pub target: Category,
    pub reassigned: u64,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let mut category = Category::new(validate_name("name", &body.name)?);
    category.status = status_or_active(body.status.as_deref())?;

    let category = state.db.categories().insert(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<Vec<CategorySummary>>> {
    Ok(Json(state.db.categories().summary().await?))
}

pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    let id = CategoryId::parse("id", &id)?;
    Ok(Json(state.db.categories().products(&id).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<Category>> {
    let id = CategoryId::parse("id", &id)?;
    let status = body.parse()?;

    Ok(Json(state.db.categories().set_status(&id, status).await?))
}

/// `PUT /categories/{id}/prices`: raises every sale price in the category.
///
/// `percentage` must be in `(0, 1000]`.
pub async fn increase_prices(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PriceIncreaseRequest>,
) -> ApiResult<Json<UpdatedCount>> {
    let id = CategoryId::parse("id", &id)?;
    let increase = validate_price_increase(body.percentage)?;

    debug!(id = %id, percentage = body.percentage, "Increase category prices");
    let updated = state.db.categories().increase_prices(&id, increase).await?;

    Ok(Json(UpdatedCount { updated }))
}

/// `POST /categories/{id}/merge`: `{id}` is merged into `targetId`.
pub async fn merge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MergeRequest>,
) -> ApiResult<Json<MergeResponse>> {
    let source = CategoryId::parse("id", &id)?;
    let target = CategoryId::parse("targetId", &body.target_id)?;

    let (target, reassigned) = state.db.categories().merge(&source, &target).await?;
    Ok(Json(MergeResponse { target, reassigned }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    let id = CategoryId::parse("id", &id)?;
    Ok(Json(state.db.categories().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let id = CategoryId::parse("id", &id)?;
    let mut category = state.db.categories().require(&id).await?;

    if let Some(name) = &body.name {
        category.name = validate_name("name", name)?;
    }
    if let Some(status) = &body.status {
        category.status = status_or_active(Some(status))?;
    }

    Ok(Json(state.db.categories().update(&category).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = CategoryId::parse("id", &id)?;
    state.db.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
