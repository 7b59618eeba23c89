//! # Client Routes
//!
//! ```text
//! GET    /clients                     list
//! POST   /clients                     create
//! GET    /clients/top?limit=          ranked by total purchased
//! GET    /clients/{id}/sales          sales of the client
//! PUT    /clients/{id}/status         change status
//! PUT    /clients/{id}/credit         { deltaCents }, result must stay >= 0
//! GET    /clients/{id}                get
//! PUT    /clients/{id}                partial update
//! DELETE /clients/{id}                delete (409 while sales reference it)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use stockroom_core::validation::{
    validate_credit_cents, validate_credit_delta, validate_email, validate_name, validate_text,
    validate_top_limit, MAX_NAME_LEN, MAX_TEXT_LEN,
};
use stockroom_core::{Client, ClientId, Sale, TopClient, DEFAULT_TOP_CLIENTS_LIMIT};

use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::routes::{status_or_active, StatusRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list).post(create))
        .route("/clients/top", get(top))
        .route("/clients/{id}/sales", get(sales))
        .route("/clients/{id}/status", put(set_status))
        .route("/clients/{id}/credit", put(adjust_credit))
        .route("/clients/{id}", get(get_one).put(update).delete(delete))
}

// =============================================================================
// Bodies
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateClientRequest {
    pub tax_id: String,
    pub full_name: String,
    pub address: String,
    pub references: String,
    pub phone: String,
    pub email: String,
    pub credit_cents: i64,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub tax_id: Option<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub references: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub credit_cents: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    pub delta_cents: i64,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.db.clients().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let now = Utc::now();

    let client = Client {
        id: ClientId::generate(),
        tax_id: validate_text("taxId", &body.tax_id, MAX_NAME_LEN)?,
        full_name: validate_name("fullName", &body.full_name)?,
        address: validate_text("address", &body.address, MAX_TEXT_LEN)?,
        references: validate_text("references", &body.references, MAX_TEXT_LEN)?,
        phone: validate_text("phone", &body.phone, MAX_NAME_LEN)?,
        email: validate_email(&body.email)?,
        credit_cents: validate_credit_cents(body.credit_cents)?,
        status: status_or_active(body.status.as_deref())?,
        created_at: now,
        updated_at: now,
    };

    let client = state.db.clients().insert(&client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// `GET /clients/top`: clients ranked by total purchased, `limit` in 1..=100.
pub async fn top(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> ApiResult<Json<Vec<TopClient>>> {
    let limit = validate_top_limit(query.limit.unwrap_or(DEFAULT_TOP_CLIENTS_LIMIT))?;
    Ok(Json(state.db.clients().top(limit).await?))
}

pub async fn sales(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Sale>>> {
    let id = ClientId::parse("id", &id)?;
    state.db.clients().require(&id).await?;

    Ok(Json(state.db.sales().list(Some(&id)).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<Client>> {
    let id = ClientId::parse("id", &id)?;
    let status = body.parse()?;

    Ok(Json(state.db.clients().set_status(&id, status).await?))
}

pub async fn adjust_credit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CreditRequest>,
) -> ApiResult<Json<Client>> {
    let id = ClientId::parse("id", &id)?;
    let delta_cents = validate_credit_delta(body.delta_cents)?;

    debug!(id = %id, delta_cents, "Adjust credit");
    Ok(Json(state.db.clients().adjust_credit(&id, delta_cents).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Client>> {
    let id = ClientId::parse("id", &id)?;
    Ok(Json(state.db.clients().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateClientRequest>,
) -> ApiResult<Json<Client>> {
    let id = ClientId::parse("id", &id)?;
    let mut client = state.db.clients().require(&id).await?;

    if let Some(tax_id) = &body.tax_id {
        client.tax_id = validate_text("taxId", tax_id, MAX_NAME_LEN)?;
    }
    if let Some(full_name) = &body.full_name {
        client.full_name = validate_name("fullName", full_name)?;
    }
    if let Some(address) = &body.address {
        client.address = validate_text("address", address, MAX_TEXT_LEN)?;
    }
    if let Some(references) = &body.references {
        client.references = validate_text("references", references, MAX_TEXT_LEN)?;
    }
    if let Some(phone) = &body.phone {
        client.phone = validate_text("phone", phone, MAX_NAME_LEN)?;
    }
    if let Some(email) = &body.email {
        client.email = validate_email(email)?;
    }
    if let Some(credit) = body.credit_cents {
        client.credit_cents = validate_credit_cents(credit)?;
    }
    if let Some(status) = &body.status {
        client.status = status_or_active(Some(status))?;
    }

    Ok(Json(state.db.clients().update(&client).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = ClientId::parse("id", &id)?;
    state.db.clients().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
