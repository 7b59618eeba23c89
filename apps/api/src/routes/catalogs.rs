//! # Catalog Routes
//!
//! ```text
//! GET    /catalogs                              list
//! POST   /catalogs                              create
//! GET    /catalogs/{id}/products                products in the catalog
//! POST   /catalogs/{id}/products/{productId}    assign product (idempotent)
//! DELETE /catalogs/{id}/products/{productId}    unassign product
//! PUT    /catalogs/{id}/status                  change status
//! GET    /catalogs/{id}                         get
//! PUT    /catalogs/{id}                         partial update, productIds replaces the list
//! DELETE /catalogs/{id}                         delete (409 while suppliers reference it)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use stockroom_core::validation::{validate_name, validate_text, MAX_TEXT_LEN};
use stockroom_core::{Catalog, CatalogId, Product, ProductId};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::routes::{status_or_active, StatusRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalogs", get(list).post(create))
        .route("/catalogs/{id}/products", get(products))
        .route(
            "/catalogs/{id}/products/{product_id}",
            post(add_product).delete(remove_product),
        )
        .route("/catalogs/{id}/status", put(set_status))
        .route("/catalogs/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCatalogRequest {
    pub name: String,
    pub file_path: String,
    pub product_ids: Vec<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCatalogRequest {
    pub name: Option<String>,
    pub file_path: Option<String>,
    pub product_ids: Option<Vec<String>>,
    pub status: Option<String>,
}

fn parse_product_ids(raw: &[String]) -> ApiResult<Vec<ProductId>> {
    raw.iter()
        .map(|id| ProductId::parse("productIds", id).map_err(ApiError::from))
        .collect()
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Catalog>>> {
    Ok(Json(state.db.catalogs().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCatalogRequest>,
) -> ApiResult<(StatusCode, Json<Catalog>)> {
    let now = Utc::now();

    let catalog = Catalog {
        id: CatalogId::generate(),
        name: validate_name("name", &body.name)?,
        file_path: validate_text("filePath", &body.file_path, MAX_TEXT_LEN)?,
        product_ids: parse_product_ids(&body.product_ids)?,
        status: status_or_active(body.status.as_deref())?,
        created_at: now,
        updated_at: now,
    };

    let catalog = state.db.catalogs().insert(&catalog).await?;
    Ok((StatusCode::CREATED, Json(catalog)))
}

pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    let id = CatalogId::parse("id", &id)?;
    state.db.catalogs().require(&id).await?;

    Ok(Json(state.db.catalogs().products(&id).await?))
}

pub async fn add_product(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Catalog>> {
    let id = CatalogId::parse("id", &id)?;
    let product_id = ProductId::parse("productId", &product_id)?;

    Ok(Json(state.db.catalogs().add_product(&id, &product_id).await?))
}

pub async fn remove_product(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Catalog>> {
    let id = CatalogId::parse("id", &id)?;
    let product_id = ProductId::parse("productId", &product_id)?;

    Ok(Json(state.db.catalogs().remove_product(&id, &product_id).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<Catalog>> {
    let id = CatalogId::parse("id", &id)?;
    let status = body.parse()?;

    Ok(Json(state.db.catalogs().set_status(&id, status).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Catalog>> {
    let id = CatalogId::parse("id", &id)?;
    Ok(Json(state.db.catalogs().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCatalogRequest>,
) -> ApiResult<Json<Catalog>> {
    let id = CatalogId::parse("id", &id)?;
    let mut catalog = state.db.catalogs().require(&id).await?;

    if let Some(name) = &body.name {
        catalog.name = validate_name("name", name)?;
    }
    if let Some(file_path) = &body.file_path {
        catalog.file_path = validate_text("filePath", file_path, MAX_TEXT_LEN)?;
    }
    if let Some(product_ids) = &body.product_ids {
        catalog.product_ids = parse_product_ids(product_ids)?;
    }
    if let Some(status) = &body.status {
        catalog.status = status_or_active(Some(status))?;
    }

    Ok(Json(state.db.catalogs().update(&catalog).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = CatalogId::parse("id", &id)?;
    state.db.catalogs().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
