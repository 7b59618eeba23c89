//! # Category Repository
//!
//! Database operations for categories, including the two multi-row
//! category flows.
//!
//! ## Category Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/categories/{A}/merge  { "targetId": B }                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── A exists?  no → 404 (rollback)                                   │
//! │   ├── B exists?  no → 404 (rollback)                                   │
//! │   ├── UPDATE products SET category_id = B WHERE category_id = A        │
//! │   └── DELETE FROM categories WHERE id = A                              │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  (B, reassigned product count)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::count;
use crate::repository::product::PRODUCT_COLUMNS;
use stockroom_core::pricing;
use stockroom_core::{
    Category, CategoryId, CategorySummary, CoreError, Percentage, Product, ProductId,
    RecordStatus,
};

const CATEGORY_COLUMNS: &str = "id, name, status, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id");

        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    /// Gets a category by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Category))` - Category found
    /// * `Ok(None)` - Category not found
    pub async fn get_by_id(&self, id: &CategoryId) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");

        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Gets a category or fails with NotFound.
    pub async fn require(&self, id: &CategoryId) -> DbResult<Category> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Inserts a new category.
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(category.id.as_str())
        .bind(&category.name)
        .bind(category.status.as_str())
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %category.id, "Category created");
        Ok(category.clone())
    }

    /// Updates an existing category.
    ///
    /// ## Returns
    /// * `Ok(Category)` - The stored category (with refreshed `updated_at`)
    /// * `Err(DbError::NotFound)` - Category doesn't exist
    pub async fn update(&self, category: &Category) -> DbResult<Category> {
        debug!(id = %category.id, "Updating category");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                status = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(category.id.as_str())
        .bind(&category.name)
        .bind(category.status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        info!(id = %category.id, "Category updated");
        Ok(Category {
            updated_at: now,
            ..category.clone()
        })
    }

    /// Changes the status of a category.
    pub async fn set_status(&self, id: &CategoryId, status: RecordStatus) -> DbResult<Category> {
        let mut category = self.require(id).await?;
        category.status = status;
        self.update(&category).await
    }

    /// Deletes a category.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Category doesn't exist
    /// * `CoreError::StillReferenced` - Products still belong to it (409)
    pub async fn delete(&self, id: &CategoryId) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM categories WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Category", id));
        }

        let products = count(
            &mut *tx,
            "SELECT COUNT(*) FROM products WHERE category_id = ?1",
            id.as_str(),
        )
        .await?;

        if products > 0 {
            warn!(id = %id, products, "Refusing to delete referenced category");
            return Err(CoreError::StillReferenced {
                entity: "Category",
                id: id.to_string(),
                referrer: "products",
                count: products,
            }
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Category deleted");
        Ok(())
    }

    /// Lists the products of a category.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Category doesn't exist
    pub async fn products(&self, id: &CategoryId) -> DbResult<Vec<Product>> {
        self.require(id).await?;

        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY name, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Raises the sale price of every product in the category.
    ///
    /// ## How It Works
    /// Each new price is `salePrice × (1 + p/100)` rounded half-up to the
    /// cent, computed with integer math in [`pricing::increased_price`].
    /// All rows are updated inside one transaction.
    ///
    /// ## Returns
    /// Number of products updated.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Category doesn't exist
    /// * `DbError::Domain` - a new price would exceed the price ceiling; nothing is written
    pub async fn increase_prices(&self, id: &CategoryId, increase: Percentage) -> DbResult<u64> {
        debug!(id = %id, bps = increase.bps(), "Bulk price update");

        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM categories WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Category", id));
        }

        let prices: Vec<(ProductId, i64)> =
            sqlx::query_as("SELECT id, sale_price_cents FROM products WHERE category_id = ?1")
                .bind(id.as_str())
                .fetch_all(&mut *tx)
                .await?;

        let now = Utc::now();
        let mut updated = 0;

        for (product_id, sale_price_cents) in &prices {
            let new_price = pricing::increased_price(*sale_price_cents, increase)?;

            updated += sqlx::query(
                "UPDATE products SET sale_price_cents = ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(product_id.as_str())
            .bind(new_price)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        info!(id = %id, updated, "Category prices increased");
        Ok(updated)
    }

    /// Moves every product of `source` into `target`, then deletes `source`.
    ///
    /// ## Errors
    /// * `CoreError::InvalidOperation` - source and target are the same
    /// * `DbError::NotFound` - source or target doesn't exist
    ///
    /// ## Returns
    /// The target category and the number of reassigned products.
    pub async fn merge(
        &self,
        source: &CategoryId,
        target: &CategoryId,
    ) -> DbResult<(Category, u64)> {
        if source == target {
            warn!(id = %source, "Refusing to merge a category into itself");
            return Err(CoreError::InvalidOperation(
                "cannot merge a category into itself".to_string(),
            )
            .into());
        }

        debug!(source = %source, target = %target, "Merging categories");

        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");

        sqlx::query_as::<_, Category>(&sql)
            .bind(source.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Category", source))?;

        let target_category = sqlx::query_as::<_, Category>(&sql)
            .bind(target.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Category", target))?;

        let now = Utc::now();

        let reassigned = sqlx::query(
            "UPDATE products SET category_id = ?2, updated_at = ?3 WHERE category_id = ?1",
        )
        .bind(source.as_str())
        .bind(target.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(source.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(source = %source, target = %target, reassigned, "Categories merged");
        Ok((target_category, reassigned))
    }

    /// Per-category product count, stock units and inventory value.
    ///
    /// Inventory value is `stock × unit cost` where unit cost is the
    /// purchase price divided by the quantity included, rounded half-up.
    /// Sorted by product count, largest first.
    pub async fn summary(&self) -> DbResult<Vec<CategorySummary>> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT
                c.id AS category_id,
                c.name AS name,
                COUNT(p.id) AS product_count,
                COALESCE(SUM(p.stock), 0) AS total_stock,
                COALESCE(SUM(
                    p.stock * ((p.purchase_price_cents + p.quantity_included / 2) / p.quantity_included)
                ), 0) AS inventory_value_cents
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY product_count DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
