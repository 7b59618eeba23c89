//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Guarded stock adjustment
//! - Low-stock listing and dashboard counters
//!
//! ## Guarded Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, check in Rust, write absolute value               │
//! │     SELECT stock ...; UPDATE products SET stock = 7 ...            │
//! │     (two requests can both pass the check)                         │
//! │                                                                     │
//! │  ✅ CORRECT: delta with the guard in the WHERE clause              │
//! │     UPDATE products SET stock = stock + ?delta                     │
//! │     WHERE id = ? AND stock + ?delta BETWEEN 0 AND ?max             │
//! │                                                                     │
//! │  rows_affected = 0 → product missing or stock out of range         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use stockroom_core::{
    CategoryId, CoreError, Product, ProductCounts, ProductId, RecordStatus, MAX_STOCK,
};

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, category_id, purchase_unit, \
     quantity_included, sale_unit, purchase_price_cents, sale_price_cents, stock, status, \
     created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_id(&id).await?;
/// let low = repo.low_stock(10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name, optionally limited to one category.
    pub async fn list(&self, category: Option<&CategoryId>) -> DbResult<Vec<Product>> {
        debug!(category = ?category.map(CategoryId::as_str), "Listing products");

        let products = match category {
            Some(category_id) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY name, id"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(category_id.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
                sqlx::query_as::<_, Product>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &ProductId) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product or fails with NotFound.
    pub async fn require(&self, id: &ProductId) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts a new product.
    ///
    /// The caller checks that the category exists.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category_id, purchase_unit, quantity_included, sale_unit,
                purchase_price_cents, sale_price_cents, stock, status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12
            )
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.category_id.as_str())
        .bind(&product.purchase_unit)
        .bind(product.quantity_included)
        .bind(&product.sale_unit)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %product.id, "Product created");
        Ok(product.clone())
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product (with refreshed `updated_at`)
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category_id = ?3,
                purchase_unit = ?4,
                quantity_included = ?5,
                sale_unit = ?6,
                purchase_price_cents = ?7,
                sale_price_cents = ?8,
                stock = ?9,
                status = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.category_id.as_str())
        .bind(&product.purchase_unit)
        .bind(product.quantity_included)
        .bind(&product.sale_unit)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        info!(id = %product.id, "Product updated");
        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    /// Changes the status of a product.
    pub async fn set_status(&self, id: &ProductId, status: RecordStatus) -> DbResult<Product> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.as_str())
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, status = %status, "Product status changed");
        self.require(id).await
    }

    /// Adds `delta` to the stock of a product.
    ///
    /// ## Arguments
    /// * `delta` - Change in stock (negative to take out, positive to restock)
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Product doesn't exist
    /// * `CoreError::InsufficientStock` - Stock would go below zero
    /// * `CoreError::InvalidOperation` - Stock would exceed [`MAX_STOCK`]
    ///
    /// An overflowing sum turns into a REAL inside SQLite and fails the
    /// upper bound, so no row is written.
    pub async fn adjust_stock(&self, id: &ProductId, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0 AND stock + ?2 <= ?4
            "#,
        )
        .bind(id.as_str())
        .bind(delta)
        .bind(now)
        .bind(MAX_STOCK)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let product = self.require(id).await?;
            warn!(id = %id, stock = product.stock, delta, "Stock adjustment rejected");

            if delta > 0 {
                return Err(CoreError::InvalidOperation(format!(
                    "stock of {} cannot exceed {MAX_STOCK}",
                    product.name
                ))
                .into());
            }
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: delta.checked_neg().unwrap_or(i64::MAX),
            }
            .into());
        }

        let product = self.require(id).await?;
        info!(id = %id, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    /// Deletes a product and removes it from every catalog.
    ///
    /// Sale items keep their snapshot of the product.
    pub async fn delete(&self, id: &ProductId) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let unlinked = sqlx::query("DELETE FROM catalog_products WHERE product_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(id = %id, unlinked, "Product deleted");
        Ok(())
    }

    /// Lists products whose stock is at or below `threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ?1 ORDER BY stock, name"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        debug!(threshold, count = products.len(), "Low stock products");
        Ok(products)
    }

    /// Counts products by status and stock.
    pub async fn counts(&self) -> DbResult<ProductCounts> {
        let counts = sqlx::query_as::<_, ProductCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active,
                COALESCE(SUM(CASE WHEN status = 'inactive' THEN 1 ELSE 0 END), 0) AS inactive,
                COALESCE(SUM(CASE WHEN stock = 0 THEN 1 ELSE 0 END), 0) AS out_of_stock
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Counts all products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_category, seed_product, test_db};

    #[tokio::test]
    async fn test_create_then_get() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let created = seed_product(&db, &category, "Rice 1kg", 150, 20).await;

        let fetched = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let db = test_db().await;
        let a = seed_category(&db, "A").await;
        let b = seed_category(&db, "B").await;
        seed_product(&db, &a, "Apple", 100, 1).await;
        seed_product(&db, &b, "Bread", 100, 1).await;

        assert_eq!(db.products().list(None).await.unwrap().len(), 2);

        let only_a = db.products().list(Some(&a.id)).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].name, "Apple");
    }

    #[tokio::test]
    async fn test_update_keeps_other_fields() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let mut product = seed_product(&db, &category, "Rice", 150, 20).await;

        product.sale_price_cents = 175;
        db.products().update(&product).await.unwrap();

        let fetched = db.products().require(&product.id).await.unwrap();
        assert_eq!(fetched.sale_price_cents, 175);
        assert_eq!(fetched.name, "Rice");
        assert_eq!(fetched.stock, 20);
    }

    #[tokio::test]
    async fn test_adjust_stock_guards_negative() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let product = seed_product(&db, &category, "Rice", 150, 3).await;

        let restocked = db.products().adjust_stock(&product.id, 7).await.unwrap();
        assert_eq!(restocked.stock, 10);

        let err = db.products().adjust_stock(&product.id, -11).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 10, requested: 11, .. })
        ));
        assert_eq!(db.products().require(&product.id).await.unwrap().stock, 10);

        let err = db
            .products()
            .adjust_stock(&ProductId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock_extremes_leave_row_intact() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let product = seed_product(&db, &category, "Rice", 150, 3).await;

        let err = db
            .products()
            .adjust_stock(&product.id, i64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidOperation(_))));

        let err = db
            .products()
            .adjust_stock(&product.id, MAX_STOCK)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidOperation(_))));

        let err = db
            .products()
            .adjust_stock(&product.id, i64::MIN)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { requested: i64::MAX, .. })
        ));

        // Column still decodes as an integer
        let listed = db.products().list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stock, 3);

        let topped = db
            .products()
            .adjust_stock(&product.id, MAX_STOCK - 3)
            .await
            .unwrap();
        assert_eq!(topped.stock, MAX_STOCK);
    }

    #[tokio::test]
    async fn test_low_stock_threshold() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let low = seed_product(&db, &category, "Low", 100, 3).await;
        let edge = seed_product(&db, &category, "Edge", 100, 10).await;
        seed_product(&db, &category, "Plenty", 100, 11).await;

        let result = db.products().low_stock(10).await.unwrap();
        let ids: Vec<_> = result.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&low.id));
        assert!(ids.contains(&edge.id));
    }

    #[tokio::test]
    async fn test_counts() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        seed_product(&db, &category, "Empty", 100, 0).await;
        let other = seed_product(&db, &category, "Other", 100, 5).await;
        db.products()
            .set_status(&other.id, RecordStatus::Inactive)
            .await
            .unwrap();

        let counts = db.products().counts().await.unwrap();
        assert_eq!(
            counts,
            ProductCounts {
                total: 2,
                active: 1,
                inactive: 1,
                out_of_stock: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_delete_removes_product() {
        let db = test_db().await;
        let category = seed_category(&db, "Grocery").await;
        let product = seed_product(&db, &category, "Rice", 150, 3).await;

        db.products().delete(&product.id).await.unwrap();

        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
