//! # Supplier Routes
//!
//! ```text
//! GET    /suppliers                  list
//! POST   /suppliers                  create
//! GET    /suppliers/summary          supplier count per catalog
//! PUT    /suppliers/{id}/catalog     link a catalog { catalogId }
//! DELETE /suppliers/{id}/catalog     unlink the catalog
//! PUT    /suppliers/{id}/status      change status
//! GET    /suppliers/{id}             get
//! PUT    /suppliers/{id}             partial update
//! DELETE /suppliers/{id}             delete
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use stockroom_core::validation::{validate_name, validate_text, MAX_NAME_LEN};
use stockroom_core::{CatalogId, Supplier, SupplierId, SupplierSummary};

use crate::error::{ApiJson, ApiResult};
use crate::routes::{status_or_active, StatusRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list).post(create))
        .route("/suppliers/summary", get(summary))
        .route(
            "/suppliers/{id}/catalog",
            put(assign_catalog).delete(remove_catalog),
        )
        .route("/suppliers/{id}/status", put(set_status))
        .route("/suppliers/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSupplierRequest {
    pub id_number: String,
    pub company: String,
    pub contact_name: String,
    pub phone: String,
    pub bank_account: String,
    pub bank_name: String,
    pub catalog_id: Option<String>,
    pub status: Option<String>,
}

/// Partial update. `catalogId` is managed through `/suppliers/{id}/catalog`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierRequest {
    pub id_number: Option<String>,
    pub company: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCatalogRequest {
    #[serde(default)]
    pub catalog_id: String,
}

fn optional_catalog(raw: Option<&str>) -> ApiResult<Option<CatalogId>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(CatalogId::parse("catalogId", raw)?)),
    }
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSupplierRequest>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let now = Utc::now();

    let supplier = Supplier {
        id: SupplierId::generate(),
        id_number: validate_text("idNumber", &body.id_number, MAX_NAME_LEN)?,
        company: validate_name("company", &body.company)?,
        contact_name: validate_text("contactName", &body.contact_name, MAX_NAME_LEN)?,
        phone: validate_text("phone", &body.phone, MAX_NAME_LEN)?,
        bank_account: validate_text("bankAccount", &body.bank_account, MAX_NAME_LEN)?,
        bank_name: validate_text("bankName", &body.bank_name, MAX_NAME_LEN)?,
        catalog_id: optional_catalog(body.catalog_id.as_deref())?,
        status: status_or_active(body.status.as_deref())?,
        created_at: now,
        updated_at: now,
    };

    let supplier = state.db.suppliers().insert(&supplier).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<Vec<SupplierSummary>>> {
    Ok(Json(state.db.suppliers().summary().await?))
}

pub async fn assign_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AssignCatalogRequest>,
) -> ApiResult<Json<Supplier>> {
    let id = SupplierId::parse("id", &id)?;
    let catalog_id = CatalogId::parse("catalogId", &body.catalog_id)?;

    Ok(Json(state.db.suppliers().set_catalog(&id, Some(catalog_id)).await?))
}

pub async fn remove_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    let id = SupplierId::parse("id", &id)?;
    Ok(Json(state.db.suppliers().set_catalog(&id, None).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<Supplier>> {
    let id = SupplierId::parse("id", &id)?;
    let status = body.parse()?;

    Ok(Json(state.db.suppliers().set_status(&id, status).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    let id = SupplierId::parse("id", &id)?;
    Ok(Json(state.db.suppliers().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateSupplierRequest>,
) -> ApiResult<Json<Supplier>> {
    let id = SupplierId::parse("id", &id)?;
    let mut supplier = state.db.suppliers().require(&id).await?;

    if let Some(id_number) = &body.id_number {
        supplier.id_number = validate_text("idNumber", id_number, MAX_NAME_LEN)?;
    }
    if let Some(company) = &body.company {
        supplier.company = validate_name("company", company)?;
    }
    if let Some(contact_name) = &body.contact_name {
        supplier.contact_name = validate_text("contactName", contact_name, MAX_NAME_LEN)?;
    }
    if let Some(phone) = &body.phone {
        supplier.phone = validate_text("phone", phone, MAX_NAME_LEN)?;
    }
    if let Some(bank_account) = &body.bank_account {
        supplier.bank_account = validate_text("bankAccount", bank_account, MAX_NAME_LEN)?;
    }
    if let Some(bank_name) = &body.bank_name {
        supplier.bank_name = validate_text("bankName", bank_name, MAX_NAME_LEN)?;
    }
    if let Some(status) = &body.status {
        supplier.status = status_or_active(Some(status))?;
    }

    Ok(Json(state.db.suppliers().update(&supplier).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = SupplierId::parse("id", &id)?;
    state.db.suppliers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;
    use stockroom_core::{Catalog, RecordStatus};

    async fn seed_catalog(state: &AppState, name: &str) -> Catalog {
        let now = Utc::now();
        state
            .db
            .catalogs()
            .insert(&Catalog {
                id: CatalogId::generate(),
                name: name.to_string(),
                file_path: String::new(),
                product_ids: Vec::new(),
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    fn request(company: &str, catalog: Option<&Catalog>) -> CreateSupplierRequest {
        CreateSupplierRequest {
            company: company.to_string(),
            contact_name: "Luis".to_string(),
            catalog_id: catalog.map(|c| c.id.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_unknown_catalog() {
        let state = test_state().await;

        let err = create(
            State(state),
            ApiJson(CreateSupplierRequest {
                company: "Acme".to_string(),
                catalog_id: Some(CatalogId::generate().to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_and_missing_ids() {
        let state = test_state().await;
        let (_, Json(supplier)) = create(State(state.clone()), ApiJson(request("Acme", None)))
            .await
            .unwrap();

        let err = get_one(State(state.clone()), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = assign_catalog(
            State(state.clone()),
            Path(supplier.id.to_string()),
            ApiJson(AssignCatalogRequest {
                catalog_id: "42".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = delete(State(state), Path(SupplierId::generate().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assign_and_remove_catalog() {
        let state = test_state().await;
        let catalog = seed_catalog(&state, "Summer").await;
        let (_, Json(supplier)) = create(State(state.clone()), ApiJson(request("Acme", None)))
            .await
            .unwrap();
        assert_eq!(supplier.catalog_id, None);

        let Json(linked) = assign_catalog(
            State(state.clone()),
            Path(supplier.id.to_string()),
            ApiJson(AssignCatalogRequest {
                catalog_id: catalog.id.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(linked.catalog_id, Some(catalog.id.clone()));

        let err = crate::routes::catalogs::delete(State(state.clone()), Path(catalog.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let Json(unlinked) = remove_catalog(State(state), Path(supplier.id.to_string()))
            .await
            .unwrap();
        assert_eq!(unlinked.catalog_id, None);
        assert_eq!(unlinked.company, "Acme");
    }

    #[tokio::test]
    async fn test_summary_groups_by_catalog() {
        let state = test_state().await;
        let summer = seed_catalog(&state, "Summer").await;

        for company in ["Acme", "Globex"] {
            create(State(state.clone()), ApiJson(request(company, Some(&summer))))
                .await
                .unwrap();
        }
        create(State(state.clone()), ApiJson(request("Initech", None)))
            .await
            .unwrap();

        let Json(groups) = summary(State(state)).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].catalog_id, Some(summer.id));
        assert_eq!(groups[0].supplier_count, 2);
        assert_eq!(groups[1].catalog_id, None);
        assert_eq!(groups[1].supplier_count, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let state = test_state().await;
        let (_, Json(supplier)) = create(State(state.clone()), ApiJson(request("Acme", None)))
            .await
            .unwrap();

        let Json(updated) = update(
            State(state.clone()),
            Path(supplier.id.to_string()),
            ApiJson(UpdateSupplierRequest {
                bank_name: Some("First Bank".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.bank_name, "First Bank");
        assert_eq!(updated.contact_name, "Luis");

        let status = delete(State(state), Path(supplier.id.to_string())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
