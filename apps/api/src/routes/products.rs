//! # Product Routes
//!
//! ```text
//! GET    /products?categoryId=        list (optionally by category)
//! POST   /products                    create (category must exist)
//! GET    /products/low-stock          stock <= ?threshold
//! GET    /products/count              total / active / inactive / out of stock
//! PUT    /products/{id}/stock         { delta }, result must stay >= 0
//! PUT    /products/{id}/status        change status
//! GET    /products/{id}/profit        unit margin and potential profit
//! GET    /products/{id}               get
//! PUT    /products/{id}               partial update (category re-checked)
//! DELETE /products/{id}               delete
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use stockroom_core::pricing;
use stockroom_core::validation::{
    validate_name, validate_price_cents, validate_quantity_included, validate_stock,
    validate_stock_delta,
};
use stockroom_core::{CategoryId, Product, ProductCounts, ProductId, ProductProfit};

use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::routes::{status_or_active, StatusRequest, ThresholdQuery};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/low-stock", get(low_stock))
        .route("/products/count", get(count))
        .route("/products/{id}/stock", put(adjust_stock))
        .route("/products/{id}/status", put(set_status))
        .route("/products/{id}/profit", get(profit))
        .route("/products/{id}", get(get_one).put(update).delete(delete))
}

// =============================================================================
// Bodies
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProductRequest {
    pub name: String,
    pub category_id: String,
    pub purchase_unit: String,
    /// Sale units per purchase unit, default 1.
    pub quantity_included: Option<i64>,
    pub sale_unit: String,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub stock: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub purchase_unit: Option<String>,
    pub quantity_included: Option<i64>,
    pub sale_unit: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockRequest {
    pub delta: i64,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let category = query
        .category_id
        .as_deref()
        .map(|raw| CategoryId::parse("categoryId", raw))
        .transpose()?;

    Ok(Json(state.db.products().list(category.as_ref()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let category_id = CategoryId::parse("categoryId", &body.category_id)?;
    let now = Utc::now();

    let product = Product {
        id: ProductId::generate(),
        name: validate_name("name", &body.name)?,
        category_id,
        purchase_unit: validate_name("purchaseUnit", &body.purchase_unit)?,
        quantity_included: validate_quantity_included(body.quantity_included.unwrap_or(1))?,
        sale_unit: validate_name("saleUnit", &body.sale_unit)?,
        purchase_price_cents: validate_price_cents("purchasePriceCents", body.purchase_price_cents)?,
        sale_price_cents: validate_price_cents("salePriceCents", body.sale_price_cents)?,
        stock: validate_stock(body.stock.unwrap_or(0))?,
        status: status_or_active(body.status.as_deref())?,
        created_at: now,
        updated_at: now,
    };

    state.db.categories().require(&product.category_id).await?;

    let product = state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/low-stock`: products with `stock <= threshold`.
///
/// The threshold defaults to the configured `LOW_STOCK_THRESHOLD`.
pub async fn low_stock(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ThresholdQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let threshold = query.resolve(state.config.low_stock_threshold)?;
    Ok(Json(state.db.products().low_stock(threshold).await?))
}

pub async fn count(State(state): State<AppState>) -> ApiResult<Json<ProductCounts>> {
    Ok(Json(state.db.products().counts().await?))
}

/// `PUT /products/{id}/stock`: adds `delta` (may be negative) to stock.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StockRequest>,
) -> ApiResult<Json<Product>> {
    let id = ProductId::parse("id", &id)?;
    let delta = validate_stock_delta(body.delta)?;

    debug!(id = %id, delta, "Adjust stock");
    Ok(Json(state.db.products().adjust_stock(&id, delta).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<Product>> {
    let id = ProductId::parse("id", &id)?;
    let status = body.parse()?;

    Ok(Json(state.db.products().set_status(&id, status).await?))
}

pub async fn profit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductProfit>> {
    let id = ProductId::parse("id", &id)?;
    let product = state.db.products().require(&id).await?;

    Ok(Json(pricing::product_profit(&product)?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = ProductId::parse("id", &id)?;
    Ok(Json(state.db.products().require(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let id = ProductId::parse("id", &id)?;
    let mut product = state.db.products().require(&id).await?;

    if let Some(name) = &body.name {
        product.name = validate_name("name", name)?;
    }
    if let Some(raw) = &body.category_id {
        let category_id = CategoryId::parse("categoryId", raw)?;
        state.db.categories().require(&category_id).await?;
        product.category_id = category_id;
    }
    if let Some(unit) = &body.purchase_unit {
        product.purchase_unit = validate_name("purchaseUnit", unit)?;
    }
    if let Some(qty) = body.quantity_included {
        product.quantity_included = validate_quantity_included(qty)?;
    }
    if let Some(unit) = &body.sale_unit {
        product.sale_unit = validate_name("saleUnit", unit)?;
    }
    if let Some(cents) = body.purchase_price_cents {
        product.purchase_price_cents = validate_price_cents("purchasePriceCents", cents)?;
    }
    if let Some(cents) = body.sale_price_cents {
        product.sale_price_cents = validate_price_cents("salePriceCents", cents)?;
    }
    if let Some(stock) = body.stock {
        product.stock = validate_stock(stock)?;
    }
    if let Some(status) = &body.status {
        product.status = status_or_active(Some(status))?;
    }

    Ok(Json(state.db.products().update(&product).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = ProductId::parse("id", &id)?;
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::test_state;
    use stockroom_core::Category;

    fn request(category: &Category, name: &str, stock: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            category_id: category.id.to_string(),
            purchase_unit: "box".to_string(),
            quantity_included: Some(12),
            sale_unit: "bottle".to_string(),
            purchase_price_cents: 1_200,
            sale_price_cents: 150,
            stock: Some(stock),
            status: None,
        }
    }

    async fn seed(state: &AppState, category: &Category, name: &str, stock: i64) -> Product {
        let (_, Json(product)) = create(
            State(state.clone()),
            ApiJson(request(category, name, stock)),
        )
        .await
        .unwrap();
        product
    }

    async fn category(state: &AppState) -> Category {
        state
            .db
            .categories()
            .insert(&Category::new("Drinks"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let state = test_state().await;
        let category = category(&state).await;

        let mut negative = request(&category, "Water", 1);
        negative.sale_price_cents = -1;
        let err = create(State(state.clone()), ApiJson(negative)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let mut orphan = request(&category, "Water", 1);
        orphan.category_id = CategoryId::generate().to_string();
        let err = create(State(state.clone()), ApiJson(orphan)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let mut malformed = request(&category, "Water", 1);
        malformed.category_id = "abc".to_string();
        let err = create(State(state.clone()), ApiJson(malformed)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut pricey = request(&category, "Water", 1);
        pricey.sale_price_cents = stockroom_core::MAX_PRICE_CENTS + 1;
        let err = create(State(state.clone()), ApiJson(pricey)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let overstocked = request(&category, "Water", stockroom_core::MAX_STOCK + 1);
        let err = create(State(state), ApiJson(overstocked)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_malformed_and_missing_ids() {
        let state = test_state().await;

        let err = get_one(State(state.clone()), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = adjust_stock(
            State(state.clone()),
            Path("42".to_string()),
            ApiJson(StockRequest { delta: 1 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = delete(State(state), Path(ProductId::generate().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let state = test_state().await;
        let category = category(&state).await;
        let product = seed(&state, &category, "Water", 20).await;

        let Json(updated) = update(
            State(state.clone()),
            Path(product.id.to_string()),
            ApiJson(UpdateProductRequest {
                sale_price_cents: Some(175),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.sale_price_cents, 175);
        assert_eq!(updated.name, "Water");
        assert_eq!(updated.stock, 20);
        assert_eq!(updated.quantity_included, 12);
    }

    #[tokio::test]
    async fn test_low_stock_uses_threshold() {
        let state = test_state().await;
        let category = category(&state).await;
        seed(&state, &category, "Juice", 3).await;
        seed(&state, &category, "Soda", 10).await;
        seed(&state, &category, "Water", 11).await;

        let Json(low) = low_stock(State(state.clone()), ApiQuery(ThresholdQuery::default()))
            .await
            .unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Juice", "Soda"]);

        let Json(low) = low_stock(
            State(state.clone()),
            ApiQuery(ThresholdQuery { threshold: Some(3) }),
        )
        .await
        .unwrap();
        assert_eq!(low.len(), 1);

        let err = low_stock(State(state), ApiQuery(ThresholdQuery { threshold: Some(-1) }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_adjust_stock_below_zero() {
        let state = test_state().await;
        let category = category(&state).await;
        let product = seed(&state, &category, "Water", 2).await;

        let err = adjust_stock(
            State(state.clone()),
            Path(product.id.to_string()),
            ApiJson(StockRequest { delta: -3 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let Json(product) = adjust_stock(
            State(state),
            Path(product.id.to_string()),
            ApiJson(StockRequest { delta: -2 }),
        )
        .await
        .unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_extreme_delta() {
        let state = test_state().await;
        let category = category(&state).await;
        let product = seed(&state, &category, "Water", 2).await;

        for delta in [i64::MAX, i64::MIN] {
            let err = adjust_stock(
                State(state.clone()),
                Path(product.id.to_string()),
                ApiJson(StockRequest { delta }),
            )
            .await
            .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }

        let Json(all) = list(State(state), ApiQuery(ProductListQuery::default()))
            .await
            .unwrap();
        assert_eq!(all[0].stock, 2);
    }

    #[tokio::test]
    async fn test_profit_and_delete() {
        let state = test_state().await;
        let category = category(&state).await;
        let product = seed(&state, &category, "Water", 4).await;

        // 1200 / 12 = 100 per bottle, sold at 150
        let Json(profit) = profit(State(state.clone()), Path(product.id.to_string()))
            .await
            .unwrap();
        assert_eq!(profit.unit_cost_cents, 100);
        assert_eq!(profit.unit_margin_cents, 50);
        assert_eq!(profit.potential_profit_cents, 200);

        let status = delete(State(state.clone()), Path(product.id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_one(State(state), Path(product.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
