//! # Notification Routes
//!
//! ```text
//! GET    /notifications?unread=true          list, newest first
//! POST   /notifications                      create
//! GET    /notifications/unread/count         { count }
//! PUT    /notifications/read-all             { updated }
//! POST   /notifications/low-stock?threshold= one low_stock notification per product
//! PUT    /notifications/{id}/read            mark one read
//! GET    /notifications/{id}                 get
//! PUT    /notifications/{id}                 partial update
//! DELETE /notifications/{id}                 delete
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use stockroom_core::validation::{
    validate_date, validate_notification_kind, validate_required_text, DateBound, MAX_NAME_LEN,
    MAX_TEXT_LEN,
};
use stockroom_core::{Notification, NotificationId, NotificationKind, ProductId};

use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::routes::{Count, ThresholdQuery, UpdatedCount};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list).post(create))
        .route("/notifications/unread/count", get(unread_count))
        .route("/notifications/read-all", put(mark_all_read))
        .route("/notifications/low-stock", post(generate_low_stock))
        .route("/notifications/{id}/read", put(mark_read))
        .route("/notifications/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateNotificationRequest {
    pub icon: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub product_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationRequest {
    pub icon: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
    pub read: Option<bool>,
}

/// Parses the optional product reference and checks that it exists.
async fn product_ref(state: &AppState, raw: Option<&str>) -> ApiResult<Option<ProductId>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => {
            let id = ProductId::parse("productId", raw)?;
            state.db.products().require(&id).await?;
            Ok(Some(id))
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NotificationListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.db.notifications().list(query.unread).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    let now = Utc::now();

    let icon = validate_required_text("icon", &body.icon, MAX_NAME_LEN)?;
    let message = validate_required_text("message", &body.message, MAX_TEXT_LEN)?;
    let kind = match body.kind.as_deref() {
        Some(raw) => validate_notification_kind(raw)?,
        None => NotificationKind::default(),
    };
    let date = match body.date.as_deref() {
        Some(raw) => validate_date("date", raw, DateBound::Start)?,
        None => now,
    };

    let notification = Notification {
        id: NotificationId::generate(),
        icon,
        message,
        kind,
        product_id: product_ref(&state, body.product_id.as_deref()).await?,
        date,
        read: false,
        created_at: now,
        updated_at: now,
    };

    let notification = state.db.notifications().insert(&notification).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn unread_count(State(state): State<AppState>) -> ApiResult<Json<Count>> {
    let count = state.db.notifications().unread_count().await?;
    Ok(Json(Count { count }))
}

pub async fn mark_all_read(State(state): State<AppState>) -> ApiResult<Json<UpdatedCount>> {
    let updated = state.db.notifications().mark_all_read().await?;
    Ok(Json(UpdatedCount { updated }))
}

/// `POST /notifications/low-stock`: one notification per product at or
/// below the threshold. Returns 201 even when nothing was created.
pub async fn generate_low_stock(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ThresholdQuery>,
) -> ApiResult<(StatusCode, Json<Vec<Notification>>)> {
    let threshold = query.resolve(state.config.low_stock_threshold)?;

    let created = state.db.notifications().generate_low_stock(threshold).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    let id = NotificationId::parse("id", &id)?;
    Ok(Json(state.db.notifications().mark_read(&id).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    let id = NotificationId::parse("id", &id)?;
    Ok(Json(state.db.notifications().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateNotificationRequest>,
) -> ApiResult<Json<Notification>> {
    let id = NotificationId::parse("id", &id)?;
    let mut notification = state.db.notifications().require(&id).await?;

    if let Some(icon) = &body.icon {
        notification.icon = validate_required_text("icon", icon, MAX_NAME_LEN)?;
    }
    if let Some(message) = &body.message {
        notification.message = validate_required_text("message", message, MAX_TEXT_LEN)?;
    }
    if let Some(kind) = &body.kind {
        notification.kind = validate_notification_kind(kind)?;
    }
    if let Some(date) = &body.date {
        notification.date = validate_date("date", date, DateBound::Start)?;
    }
    if let Some(read) = body.read {
        notification.read = read;
    }

    Ok(Json(state.db.notifications().update(&notification).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = NotificationId::parse("id", &id)?;
    state.db.notifications().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::test_state;
    use stockroom_core::{Category, Product, RecordStatus};

    fn request(message: &str) -> CreateNotificationRequest {
        CreateNotificationRequest {
            icon: "bell".to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    async fn seed_product(state: &AppState, name: &str, stock: i64) -> Product {
        let category = state
            .db
            .categories()
            .insert(&Category::new("Drinks"))
            .await
            .unwrap();
        let now = Utc::now();

        state
            .db
            .products()
            .insert(&Product {
                id: ProductId::generate(),
                name: name.to_string(),
                category_id: category.id,
                purchase_unit: "crate".to_string(),
                quantity_included: 12,
                sale_unit: "bottle".to_string(),
                purchase_price_cents: 1_200,
                sale_price_cents: 150,
                stock,
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_and_validation() {
        let state = test_state().await;

        let (status, Json(created)) = create(State(state.clone()), ApiJson(request("Hello")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.kind, NotificationKind::Info);
        assert!(!created.read);

        let err = create(State(state.clone()), ApiJson(request("  ")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create(
            State(state.clone()),
            ApiJson(CreateNotificationRequest {
                kind: Some("urgent".to_string()),
                ..request("Hello")
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create(
            State(state),
            ApiJson(CreateNotificationRequest {
                product_id: Some(ProductId::generate().to_string()),
                ..request("Hello")
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_and_missing_ids() {
        let state = test_state().await;

        let err = get_one(State(state.clone()), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = mark_read(State(state.clone()), Path("42".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = create(
            State(state.clone()),
            ApiJson(CreateNotificationRequest {
                product_id: Some("bogus".to_string()),
                ..request("Hello")
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = mark_read(State(state), Path(NotificationId::generate().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_flow() {
        let state = test_state().await;
        let (_, Json(first)) = create(State(state.clone()), ApiJson(request("one")))
            .await
            .unwrap();
        create(State(state.clone()), ApiJson(request("two")))
            .await
            .unwrap();
        create(State(state.clone()), ApiJson(request("three")))
            .await
            .unwrap();

        let Json(read) = mark_read(State(state.clone()), Path(first.id.to_string()))
            .await
            .unwrap();
        assert!(read.read);

        let Json(unread) = unread_count(State(state.clone())).await.unwrap();
        assert_eq!(unread.count, 2);

        let Json(only_unread) = list(
            State(state.clone()),
            ApiQuery(NotificationListQuery { unread: true }),
        )
        .await
        .unwrap();
        assert_eq!(only_unread.len(), 2);

        let Json(result) = mark_all_read(State(state.clone())).await.unwrap();
        assert_eq!(result.updated, 2);

        let Json(unread) = unread_count(State(state)).await.unwrap();
        assert_eq!(unread.count, 0);
    }

    #[tokio::test]
    async fn test_generate_low_stock() {
        let state = test_state().await;
        let soda = seed_product(&state, "Soda", 2).await;
        seed_product(&state, "Juice", 40).await;

        let (status, Json(created)) = generate_low_stock(
            State(state.clone()),
            ApiQuery(ThresholdQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, NotificationKind::LowStock);
        assert_eq!(created[0].product_id, Some(soda.id));

        let (_, Json(created)) = generate_low_stock(
            State(state.clone()),
            ApiQuery(ThresholdQuery {
                threshold: Some(50),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.len(), 2);

        let err = generate_low_stock(
            State(state),
            ApiQuery(ThresholdQuery {
                threshold: Some(-1),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let state = test_state().await;
        let (_, Json(created)) = create(State(state.clone()), ApiJson(request("Restock soon")))
            .await
            .unwrap();

        let Json(updated) = update(
            State(state.clone()),
            Path(created.id.to_string()),
            ApiJson(UpdateNotificationRequest {
                kind: Some("warning".to_string()),
                read: Some(true),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.kind, NotificationKind::Warning);
        assert!(updated.read);
        assert_eq!(updated.message, "Restock soon");

        let status = delete(State(state.clone()), Path(created.id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete(State(state), Path(created.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
