//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     ├── client must exist                                              │
//! │     ├── per line: product must exist, stock ≥ quantity                 │
//! │     │   └── UPDATE products SET stock = stock - q WHERE stock >= q     │
//! │     ├── snapshot name + unit price into sale_items                     │
//! │     └── totals computed from the items                                 │
//! │                                                                         │
//! │  2. (OPTIONAL) HEADER EDIT / DISCOUNT                                  │
//! │     └── items are immutable, totals recomputed on discount change      │
//! │                                                                         │
//! │  3a. CANCEL (one transaction)                                          │
//! │     └── stock restored per item, items + sale deleted                  │
//! │                                                                         │
//! │  3b. DELETE                                                            │
//! │     └── items + sale deleted, stock untouched                          │
//! │                                                                         │
//! │  Any failure inside a transaction rolls back every earlier write.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::count;
use crate::repository::product::PRODUCT_COLUMNS;
use stockroom_core::pricing::{self, SaleTotals};
use stockroom_core::{
    ClientId, CoreError, NewSale, Percentage, Product, Sale, SaleId, SaleItem, SaleLineRequest,
    SalesSummary,
};

const SALE_COLUMNS: &str = "id, client_id, date, subtotal_cents, discount_bps, discount_cents, \
     total_cents, notes, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, name, quantity, unit_price_cents, line_total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lists sales newest first, optionally for a single client.
    ///
    /// Every sale comes with its items.
    pub async fn list(&self, client: Option<&ClientId>) -> DbResult<Vec<Sale>> {
        let sales = match client {
            Some(client_id) => {
                let sql = format!(
                    "SELECT {SALE_COLUMNS} FROM sales WHERE client_id = ?1 ORDER BY date DESC, id"
                );
                sqlx::query_as::<_, Sale>(&sql)
                    .bind(client_id.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY date DESC, id");
                sqlx::query_as::<_, Sale>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        self.attach_items(sales).await
    }

    /// Sales whose date falls in `[from, to]`, oldest first.
    pub async fn in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE date >= ?1 AND date <= ?2 ORDER BY date, id"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        debug!(%from, %to, count = sales.len(), "Sales in range");
        self.attach_items(sales).await
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &SaleId) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut *conn, id).await
    }

    /// Gets a sale or fails with NotFound.
    pub async fn require(&self, id: &SaleId) -> DbResult<Sale> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Sale count, revenue and average ticket over all sales.
    pub async fn summary(&self) -> DbResult<SalesSummary> {
        let (sale_count, revenue_cents): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        Ok(SalesSummary::new(sale_count, revenue_cents))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Records a sale, decrementing stock when requested.
    ///
    /// ## How It Works
    /// Everything runs in one transaction. Lines are processed in order and
    /// the first failing line aborts the sale, rolling back the decrements
    /// of the lines before it.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Client or a product doesn't exist
    /// * `CoreError::InsufficientStock` - A product has less stock than requested
    pub async fn create(&self, new_sale: NewSale) -> DbResult<Sale> {
        debug!(
            client_id = %new_sale.client_id,
            lines = new_sale.items.len(),
            adjust_stock = new_sale.adjust_stock,
            "Creating sale"
        );

        let sale_id = SaleId::generate();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if count(
            &mut *tx,
            "SELECT COUNT(*) FROM clients WHERE id = ?1",
            new_sale.client_id.as_str(),
        )
        .await?
            == 0
        {
            return Err(DbError::not_found("Client", &new_sale.client_id));
        }

        let mut items = Vec::with_capacity(new_sale.items.len());

        for line in &new_sale.items {
            let product = fetch_product(&mut *tx, line).await?;

            if new_sale.adjust_stock {
                decrement_stock(&mut *tx, &product, line.quantity).await?;
            }

            items.push(pricing::line_item(
                &sale_id,
                &product,
                line.quantity,
                line.unit_price_cents,
            )?);
        }

        let totals = SaleTotals::for_items(&items, new_sale.discount)?;

        let sale = Sale {
            id: sale_id,
            client_id: new_sale.client_id,
            date: new_sale.date,
            items,
            subtotal_cents: totals.subtotal.cents(),
            discount_bps: new_sale.discount.bps() as i64,
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            notes: new_sale.notes,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, client_id, date, subtotal_cents, discount_bps, discount_cents,
                total_cents, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(sale.id.as_str())
        .bind(sale.client_id.as_str())
        .bind(sale.date)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_bps)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name, quantity, unit_price_cents,
                    line_total_cents, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(item.id.as_str())
            .bind(item.sale_id.as_str())
            .bind(item.product_id.as_str())
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            client_id = %sale.client_id,
            total_cents = sale.total_cents,
            items = sale.items.len(),
            "Sale created"
        );
        Ok(sale)
    }

    /// Updates the editable header fields: client, date and notes.
    ///
    /// Items and totals are left as they are.
    pub async fn update_header(&self, sale: &Sale) -> DbResult<Sale> {
        debug!(id = %sale.id, "Updating sale header");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET client_id = ?2, date = ?3, notes = ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(sale.id.as_str())
        .bind(sale.client_id.as_str())
        .bind(sale.date)
        .bind(&sale.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", &sale.id));
        }

        info!(id = %sale.id, "Sale updated");
        Ok(Sale {
            updated_at: now,
            ..sale.clone()
        })
    }

    /// Applies a discount and recomputes the sale totals.
    pub async fn set_discount(&self, id: &SaleId, discount: Percentage) -> DbResult<Sale> {
        let mut sale = self.require(id).await?;
        pricing::apply_discount(&mut sale, discount)?;
        sale.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE sales SET
                subtotal_cents = ?2,
                discount_bps = ?3,
                discount_cents = ?4,
                total_cents = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(sale.id.as_str())
        .bind(sale.subtotal_cents)
        .bind(sale.discount_bps)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %id, bps = discount.bps(), total_cents = sale.total_cents, "Sale discount set");
        Ok(sale)
    }

    /// Cancels a sale: restores stock for every item, then deletes it.
    ///
    /// Items whose product no longer exists are skipped.
    ///
    /// ## Returns
    /// The sale as it was before cancellation.
    pub async fn cancel(&self, id: &SaleId) -> DbResult<Sale> {
        debug!(id = %id, "Cancelling sale");

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let now = Utc::now();

        for item in &sale.items {
            let restored = sqlx::query(
                "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(item.product_id.as_str())
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if restored == 0 {
                warn!(sale_id = %id, product_id = %item.product_id, "Product gone, stock not restored");
            }
        }

        delete_sale(&mut *tx, id).await?;

        tx.commit().await?;

        info!(id = %id, items = sale.items.len(), "Sale cancelled");
        Ok(sale)
    }

    /// Deletes a sale and its items without touching stock.
    pub async fn delete(&self, id: &SaleId) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let mut tx = self.pool.begin().await?;

        if delete_sale(&mut *tx, id).await? == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        tx.commit().await?;

        info!(id = %id, "Sale deleted");
        Ok(())
    }

    /// Loads the items of `sales` in one query and attaches them.
    async fn attach_items(&self, mut sales: Vec<Sale>) -> DbResult<Vec<Sale>> {
        if sales.is_empty() {
            return Ok(sales);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id IN ("
        ));
        let mut ids = query.separated(", ");
        for sale in &sales {
            ids.push_bind(sale.id.to_string());
        }
        ids.push_unseparated(") ORDER BY sale_id, position");

        let items = query
            .build_query_as::<SaleItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<SaleId, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        Ok(sales)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_sale(conn: &mut SqliteConnection, id: &SaleId) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

    let Some(mut sale) = sqlx::query_as::<_, Sale>(&sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position");

    sale.items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(id.as_str())
        .fetch_all(&mut *conn)
        .await?;

    Ok(Some(sale))
}

async fn fetch_product(
    conn: &mut SqliteConnection,
    line: &SaleLineRequest,
) -> DbResult<Product> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

    sqlx::query_as::<_, Product>(&sql)
        .bind(line.product_id.as_str())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &line.product_id))
}

/// Guarded decrement: the WHERE clause refuses to take stock below zero.
async fn decrement_stock(
    conn: &mut SqliteConnection,
    product: &Product,
    quantity: i64,
) -> DbResult<()> {
    let insufficient = || {
        warn!(
            product_id = %product.id,
            available = product.stock,
            requested = quantity,
            "Insufficient stock"
        );
        DbError::from(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: quantity,
        })
    };

    if !product.can_fulfil(quantity) {
        return Err(insufficient());
    }

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
    )
    .bind(product.id.as_str())
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(insufficient());
    }

    Ok(())
}

/// Deletes the items and the sale row, returning the sale rows removed.
async fn delete_sale(conn: &mut SqliteConnection, id: &SaleId) -> DbResult<u64> {
    sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;

    let deleted = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_category, seed_client, seed_product, test_db};
    use stockroom_core::ProductId;

    fn line(product_id: &ProductId, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.clone(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn new_sale(client_id: &ClientId, items: Vec<SaleLineRequest>) -> NewSale {
        NewSale {
            client_id: client_id.clone(),
            date: Utc::now(),
            notes: None,
            discount: Percentage::zero(),
            items,
            adjust_stock: true,
        }
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_stock_untouched() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 1).await;
        let client = seed_client(&db, "Ana").await;

        let err = db
            .sales()
            .create(new_sale(&client.id, vec![line(&product.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 1);
        assert!(db.sales().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_cancel_restores_stock() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 250, 5).await;
        let client = seed_client(&db, "Ana").await;

        let sale = db
            .sales()
            .create(new_sale(&client.id, vec![line(&product.id, 1)]))
            .await
            .unwrap();

        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].name, "Water");
        assert_eq!(sale.total_cents, 250);
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 4);

        let fetched = db.sales().require(&sale.id).await.unwrap();
        assert_eq!(fetched.items, sale.items);

        let cancelled = db.sales().cancel(&sale.id).await.unwrap();
        assert_eq!(cancelled.id, sale.id);
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 5);
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_line_total_is_rejected() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 10).await;
        let client = seed_client(&db, "Ana").await;

        let mut huge = line(&product.id, 2);
        huge.unit_price_cents = Some(i64::MAX / 2 + 1);

        let err = db
            .sales()
            .create(new_sale(&client.id, vec![huge]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InvalidOperation(_))));
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 10);
        assert!(db.sales().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_line_failure_rolls_back_first() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let plenty = seed_product(&db, &category, "Water", 100, 10).await;
        let scarce = seed_product(&db, &category, "Juice", 300, 1).await;
        let client = seed_client(&db, "Ana").await;

        let err = db
            .sales()
            .create(new_sale(
                &client.id,
                vec![line(&plenty.id, 3), line(&scarce.id, 2)],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(db.products().require(&plenty.id).await.unwrap().stock, 10);
        assert_eq!(db.products().require(&scarce.id).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_same_product_twice_is_checked_cumulatively() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 3).await;
        let client = seed_client(&db, "Ana").await;

        let err = db
            .sales()
            .create(new_sale(
                &client.id,
                vec![line(&product.id, 2), line(&product.id, 2)],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_create_missing_client_or_product() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 3).await;
        let client = seed_client(&db, "Ana").await;

        let err = db
            .sales()
            .create(new_sale(&ClientId::generate(), vec![line(&product.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = db
            .sales()
            .create(new_sale(
                &client.id,
                vec![line(&product.id, 1), line(&ProductId::generate(), 1)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_without_stock_adjustment() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 0).await;
        let client = seed_client(&db, "Ana").await;

        let mut request = new_sale(&client.id, vec![line(&product.id, 4)]);
        request.adjust_stock = false;

        let sale = db.sales().create(request).await.unwrap();
        assert_eq!(sale.subtotal_cents, 400);
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_discount_and_explicit_price() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 10).await;
        let client = seed_client(&db, "Ana").await;

        let mut request = new_sale(
            &client.id,
            vec![SaleLineRequest {
                product_id: product.id.clone(),
                quantity: 2,
                unit_price_cents: Some(500),
            }],
        );
        request.discount = Percentage::from_bps(1_000);

        let sale = db.sales().create(request).await.unwrap();
        assert_eq!(sale.subtotal_cents, 1_000);
        assert_eq!(sale.discount_cents, 100);
        assert_eq!(sale.total_cents, 900);

        let sale = db
            .sales()
            .set_discount(&sale.id, Percentage::from_bps(5_000))
            .await
            .unwrap();
        assert_eq!(sale.total_cents, 500);
        assert_eq!(db.sales().require(&sale.id).await.unwrap().total_cents, 500);
    }

    #[tokio::test]
    async fn test_list_by_client_and_top_clients() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 100).await;
        let ana = seed_client(&db, "Ana").await;
        let bob = seed_client(&db, "Bob").await;

        db.sales()
            .create(new_sale(&ana.id, vec![line(&product.id, 1)]))
            .await
            .unwrap();
        db.sales()
            .create(new_sale(&bob.id, vec![line(&product.id, 5)]))
            .await
            .unwrap();
        db.sales()
            .create(new_sale(&bob.id, vec![line(&product.id, 1)]))
            .await
            .unwrap();

        let bobs = db.sales().list(Some(&bob.id)).await.unwrap();
        assert_eq!(bobs.len(), 2);
        assert!(bobs.iter().all(|s| s.items.len() == 1));

        let top = db.clients().top(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].client_id, bob.id);
        assert_eq!(top[0].sale_count, 2);
        assert_eq!(top[0].total_purchased_cents, 600);
        assert_eq!(top[1].client_id, ana.id);

        let summary = db.sales().summary().await.unwrap();
        assert_eq!(summary.sale_count, 3);
        assert_eq!(summary.revenue_cents, 700);
        assert_eq!(summary.average_ticket_cents, 233);
    }

    #[tokio::test]
    async fn test_in_range_and_delete() {
        let db = test_db().await;
        let category = seed_category(&db, "Drinks").await;
        let product = seed_product(&db, &category, "Water", 100, 10).await;
        let client = seed_client(&db, "Ana").await;

        let mut old = new_sale(&client.id, vec![line(&product.id, 1)]);
        old.date = "2024-01-15T10:00:00Z".parse().unwrap();
        let old = db.sales().create(old).await.unwrap();

        let mut recent = new_sale(&client.id, vec![line(&product.id, 1)]);
        recent.date = "2024-03-01T10:00:00Z".parse().unwrap();
        db.sales().create(recent).await.unwrap();

        let january = db
            .sales()
            .in_range(
                "2024-01-01T00:00:00Z".parse().unwrap(),
                "2024-01-31T23:59:59Z".parse().unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].id, old.id);

        // Delete keeps the stock as sold
        db.sales().delete(&old.id).await.unwrap();
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 8);
        assert!(matches!(
            db.sales().delete(&old.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.sales().cancel(&old.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
