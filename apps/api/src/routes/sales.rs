//! # Sale Routes
//!
//! ```text
//! GET    /sales?clientId=           list, newest first
//! POST   /sales                     record a sale (stock checked and decremented)
//! GET    /sales/range?from=&to=     sales in a date range
//! GET    /sales/summary             count, revenue, average ticket
//! POST   /sales/{id}/cancel         restore stock, delete the sale
//! PUT    /sales/{id}/discount       set discount, recompute totals
//! GET    /sales/{id}                get
//! PUT    /sales/{id}                update header (client, date, notes)
//! DELETE /sales/{id}                delete without restoring stock
//! ```
//!
//! ## Sale Creation Flow
//! ```text
//! POST /api/sales
//!      │
//!      ▼
//! parse ids, validate items/quantities/prices/date/discount ──► 400
//!      │   (nothing written yet)
//!      ▼
//! SaleRepository::create (one transaction)
//!      ├── client missing ──► 404
//!      ├── product missing ──► 404
//!      ├── stock < quantity ──► 400 INSUFFICIENT_STOCK, rollback
//!      └── insert sale + items, commit ──► 201
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use stockroom_core::types::Percentage;
use stockroom_core::validation::{
    validate_date, validate_date_range, validate_discount, validate_optional_text,
    validate_price_cents, validate_quantity, validate_sale_item_count, DateBound, MAX_TEXT_LEN,
};
use stockroom_core::{ClientId, NewSale, ProductId, Sale, SaleId, SaleLineRequest, SalesSummary};

use crate::error::{ApiJson, ApiQuery, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list).post(create))
        .route("/sales/range", get(range))
        .route("/sales/summary", get(summary))
        .route("/sales/{id}/cancel", post(cancel))
        .route("/sales/{id}/discount", put(set_discount))
        .route("/sales/{id}", get(get_one).put(update).delete(delete))
}

// =============================================================================
// Bodies
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    #[serde(default)]
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub discount_percentage: Option<f64>,
    pub adjust_stock: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    pub client_id: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountRequest {
    pub percentage: f64,
}

impl CreateSaleRequest {
    /// Checks the whole request shape before anything touches the database.
    fn validate(self) -> ApiResult<NewSale> {
        let client_id = ClientId::parse("clientId", &self.client_id)?;

        validate_sale_item_count(self.items.len())?;
        let items = self
            .items
            .iter()
            .map(|item| -> ApiResult<SaleLineRequest> {
                Ok(SaleLineRequest {
                    product_id: ProductId::parse("productId", &item.product_id)?,
                    quantity: validate_quantity(item.quantity)?,
                    unit_price_cents: item
                        .unit_price_cents
                        .map(|cents| validate_price_cents("unitPriceCents", cents))
                        .transpose()?,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        let date = match self.date.as_deref() {
            Some(raw) => validate_date("date", raw, DateBound::Start)?,
            None => Utc::now(),
        };

        let discount = match self.discount_percentage {
            Some(pct) => validate_discount(pct)?,
            None => Percentage::default(),
        };

        Ok(NewSale {
            client_id,
            date,
            notes: validate_optional_text("notes", self.notes.as_deref(), MAX_TEXT_LEN)?,
            discount,
            items,
            adjust_stock: self.adjust_stock.unwrap_or(true),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SaleListQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let client_id = query
        .client_id
        .as_deref()
        .map(|raw| ClientId::parse("clientId", raw))
        .transpose()?;

    Ok(Json(state.db.sales().list(client_id.as_ref()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let new_sale = body.validate()?;

    let sale = state.db.sales().create(new_sale).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /sales/range`: a bare `to` date includes that whole day.
pub async fn range(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let from = validate_date("from", &query.from, DateBound::Start)?;
    let to = validate_date("to", &query.to, DateBound::End)?;
    validate_date_range(from, to)?;

    Ok(Json(state.db.sales().in_range(from, to).await?))
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<SalesSummary>> {
    Ok(Json(state.db.sales().summary().await?))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let id = SaleId::parse("id", &id)?;
    Ok(Json(state.db.sales().cancel(&id).await?))
}

pub async fn set_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DiscountRequest>,
) -> ApiResult<Json<Sale>> {
    let id = SaleId::parse("id", &id)?;
    let discount = validate_discount(body.percentage)?;

    debug!(id = %id, percentage = body.percentage, "Set sale discount");
    Ok(Json(state.db.sales().set_discount(&id, discount).await?))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let id = SaleId::parse("id", &id)?;
    Ok(Json(state.db.sales().require(&id).await?))
}

/// `PUT /sales/{id}`: only the header is editable. Items are immutable.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateSaleRequest>,
) -> ApiResult<Json<Sale>> {
    let id = SaleId::parse("id", &id)?;
    let mut sale = state.db.sales().require(&id).await?;

    if let Some(client_id) = &body.client_id {
        let client_id = ClientId::parse("clientId", client_id)?;
        state.db.clients().require(&client_id).await?;
        sale.client_id = client_id;
    }
    if let Some(date) = &body.date {
        sale.date = validate_date("date", date, DateBound::Start)?;
    }
    if body.notes.is_some() {
        sale.notes = validate_optional_text("notes", body.notes.as_deref(), MAX_TEXT_LEN)?;
    }

    Ok(Json(state.db.sales().update_header(&sale).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = SaleId::parse("id", &id)?;
    state.db.sales().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::test_state;
    use stockroom_core::{Category, Client, Product, RecordStatus};

    struct Fixture {
        state: AppState,
        client: Client,
        rice: Product,
        beans: Product,
    }

    async fn fixture() -> Fixture {
        let state = test_state().await;
        let category = state
            .db
            .categories()
            .insert(&Category::new("Dry Goods"))
            .await
            .unwrap();

        let now = Utc::now();
        let client = state
            .db
            .clients()
            .insert(&Client {
                id: ClientId::generate(),
                tax_id: String::new(),
                full_name: "Ana".to_string(),
                address: String::new(),
                references: String::new(),
                phone: String::new(),
                email: "ana@example.com".to_string(),
                credit_cents: 0,
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let product = |name: &str, price: i64, stock: i64| Product {
            id: ProductId::generate(),
            name: name.to_string(),
            category_id: category.id.clone(),
            purchase_unit: "sack".to_string(),
            quantity_included: 10,
            sale_unit: "bag".to_string(),
            purchase_price_cents: price * 5,
            sale_price_cents: price,
            stock,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let rice = state.db.products().insert(&product("Rice", 100, 5)).await.unwrap();
        let beans = state.db.products().insert(&product("Beans", 250, 1)).await.unwrap();

        Fixture {
            state,
            client,
            rice,
            beans,
        }
    }

    fn line(product: &Product, quantity: i64) -> SaleItemRequest {
        SaleItemRequest {
            product_id: product.id.to_string(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn sale_request(client: &Client, items: Vec<SaleItemRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            client_id: client.id.to_string(),
            items,
            ..Default::default()
        }
    }

    async fn stock_of(state: &AppState, product: &Product) -> i64 {
        state.db.products().require(&product.id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_create_decrements_stock() {
        let f = fixture().await;

        let (status, Json(sale)) = create(
            State(f.state.clone()),
            ApiJson(sale_request(&f.client, vec![line(&f.rice, 2), line(&f.beans, 1)])),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.subtotal_cents, 450);
        assert_eq!(sale.total_cents, 450);

        assert_eq!(stock_of(&f.state, &f.rice).await, 3);
        assert_eq!(stock_of(&f.state, &f.beans).await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let f = fixture().await;

        let err = create(
            State(f.state.clone()),
            ApiJson(sale_request(&f.client, vec![line(&f.rice, 2), line(&f.beans, 2)])),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        assert_eq!(stock_of(&f.state, &f.rice).await, 5);
        assert_eq!(stock_of(&f.state, &f.beans).await, 1);

        let Json(sales) = list(State(f.state), ApiQuery(SaleListQuery::default()))
            .await
            .unwrap();
        assert!(sales.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_requests_write_nothing() {
        let f = fixture().await;

        let cases = vec![
            sale_request(&f.client, Vec::new()),
            sale_request(&f.client, vec![line(&f.rice, 0)]),
            sale_request(
                &f.client,
                vec![SaleItemRequest {
                    unit_price_cents: Some(-1),
                    ..line(&f.rice, 1)
                }],
            ),
            sale_request(
                &f.client,
                vec![SaleItemRequest {
                    unit_price_cents: Some(i64::MAX),
                    ..line(&f.rice, 2)
                }],
            ),
            sale_request(
                &f.client,
                vec![SaleItemRequest {
                    unit_price_cents: Some(stockroom_core::MAX_PRICE_CENTS + 1),
                    ..line(&f.rice, 1)
                }],
            ),
            sale_request(
                &f.client,
                vec![SaleItemRequest {
                    product_id: "nope".to_string(),
                    quantity: 1,
                    unit_price_cents: None,
                }],
            ),
            CreateSaleRequest {
                client_id: "nope".to_string(),
                items: vec![line(&f.rice, 1)],
                ..Default::default()
            },
            CreateSaleRequest {
                discount_percentage: Some(120.0),
                ..sale_request(&f.client, vec![line(&f.rice, 1)])
            },
        ];

        for request in cases {
            let err = create(State(f.state.clone()), ApiJson(request)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }

        assert_eq!(stock_of(&f.state, &f.rice).await, 5);
    }

    #[tokio::test]
    async fn test_malformed_and_missing_ids() {
        let f = fixture().await;

        let err = get_one(State(f.state.clone()), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = cancel(State(f.state.clone()), Path("42".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = set_discount(
            State(f.state.clone()),
            Path("".to_string()),
            ApiJson(DiscountRequest { percentage: 5.0 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = delete(State(f.state), Path(SaleId::generate().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_client_is_not_found() {
        let f = fixture().await;

        let err = create(
            State(f.state.clone()),
            ApiJson(CreateSaleRequest {
                client_id: ClientId::generate().to_string(),
                items: vec![line(&f.rice, 1)],
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(stock_of(&f.state, &f.rice).await, 5);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let f = fixture().await;
        let (_, Json(sale)) = create(
            State(f.state.clone()),
            ApiJson(sale_request(&f.client, vec![line(&f.rice, 3)])),
        )
        .await
        .unwrap();
        assert_eq!(stock_of(&f.state, &f.rice).await, 2);

        let Json(cancelled) = cancel(State(f.state.clone()), Path(sale.id.to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.id, sale.id);
        assert_eq!(stock_of(&f.state, &f.rice).await, 5);

        let err = get_one(State(f.state), Path(sale.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_discount_and_header_update() {
        let f = fixture().await;
        let (_, Json(sale)) = create(
            State(f.state.clone()),
            ApiJson(sale_request(&f.client, vec![line(&f.rice, 4)])),
        )
        .await
        .unwrap();

        let Json(discounted) = set_discount(
            State(f.state.clone()),
            Path(sale.id.to_string()),
            ApiJson(DiscountRequest { percentage: 25.0 }),
        )
        .await
        .unwrap();
        assert_eq!(discounted.subtotal_cents, 400);
        assert_eq!(discounted.discount_cents, 100);
        assert_eq!(discounted.total_cents, 300);

        let err = set_discount(
            State(f.state.clone()),
            Path(sale.id.to_string()),
            ApiJson(DiscountRequest { percentage: -1.0 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(updated) = update(
            State(f.state.clone()),
            Path(sale.id.to_string()),
            ApiJson(UpdateSaleRequest {
                notes: Some("paid in cash".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("paid in cash"));
        assert_eq!(updated.total_cents, 300);
        assert_eq!(updated.items.len(), 1);

        let err = update(
            State(f.state),
            Path(sale.id.to_string()),
            ApiJson(UpdateSaleRequest {
                client_id: Some(ClientId::generate().to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_range_and_summary() {
        let f = fixture().await;

        for (date, qty) in [("2024-03-01T10:00:00Z", 1), ("2024-03-05T18:30:00Z", 2)] {
            create(
                State(f.state.clone()),
                ApiJson(CreateSaleRequest {
                    date: Some(date.to_string()),
                    ..sale_request(&f.client, vec![line(&f.rice, qty)])
                }),
            )
            .await
            .unwrap();
        }

        let Json(sales) = range(
            State(f.state.clone()),
            ApiQuery(RangeQuery {
                from: "2024-03-01".to_string(),
                to: "2024-03-01".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total_cents, 100);

        let err = range(
            State(f.state.clone()),
            ApiQuery(RangeQuery {
                from: "2024-03-05".to_string(),
                to: "2024-03-01".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(summary) = summary(State(f.state)).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.revenue_cents, 300);
        assert_eq!(summary.average_ticket_cents, 150);
    }

    #[tokio::test]
    async fn test_delete_keeps_stock() {
        let f = fixture().await;
        let (_, Json(sale)) = create(
            State(f.state.clone()),
            ApiJson(sale_request(&f.client, vec![line(&f.rice, 1)])),
        )
        .await
        .unwrap();

        let status = delete(State(f.state.clone()), Path(sale.id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(stock_of(&f.state, &f.rice).await, 4);

        let Json(remaining) = list(
            State(f.state),
            ApiQuery(SaleListQuery {
                client_id: Some(f.client.id.to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(remaining.is_empty());
    }
}
