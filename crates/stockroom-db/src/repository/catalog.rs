//! # Catalog Repository
//!
//! Database operations for catalogs and their product lists.
//!
//! ## Storage
//! ```text
//! catalogs                     catalog_products
//! ┌──────────┬────────────┐    ┌────────────┬────────────┐
//! │ id       │ name, path │    │ catalog_id │ product_id │  PK (catalog_id, product_id)
//! └──────────┴────────────┘    └────────────┴────────────┘
//!                              rowid order = list order
//! ```
//!
//! `Catalog::product_ids` is loaded from `catalog_products` after the row is
//! fetched. Product ids are deduplicated and every one must exist.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::count;
use stockroom_core::{Catalog, CatalogId, CoreError, Product, ProductId, RecordStatus};

const CATALOG_COLUMNS: &str = "id, name, file_path, status, created_at, updated_at";

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Lists all catalogs with their product ids.
    pub async fn list(&self) -> DbResult<Vec<Catalog>> {
        let sql = format!("SELECT {CATALOG_COLUMNS} FROM catalogs ORDER BY name, id");

        let mut catalogs = sqlx::query_as::<_, Catalog>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let links: Vec<(CatalogId, ProductId)> =
            sqlx::query_as("SELECT catalog_id, product_id FROM catalog_products ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        let mut by_catalog: HashMap<CatalogId, Vec<ProductId>> = HashMap::new();
        for (catalog_id, product_id) in links {
            by_catalog.entry(catalog_id).or_default().push(product_id);
        }

        for catalog in &mut catalogs {
            catalog.product_ids = by_catalog.remove(&catalog.id).unwrap_or_default();
        }

        Ok(catalogs)
    }

    /// Gets a catalog (with product ids) by its ID.
    pub async fn get_by_id(&self, id: &CatalogId) -> DbResult<Option<Catalog>> {
        let sql = format!("SELECT {CATALOG_COLUMNS} FROM catalogs WHERE id = ?1");

        let catalog = sqlx::query_as::<_, Catalog>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match catalog {
            Some(mut catalog) => {
                catalog.product_ids = self.product_ids(id).await?;
                Ok(Some(catalog))
            }
            None => Ok(None),
        }
    }

    /// Gets a catalog or fails with NotFound.
    pub async fn require(&self, id: &CatalogId) -> DbResult<Catalog> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Catalog", id))
    }

    async fn product_ids(&self, id: &CatalogId) -> DbResult<Vec<ProductId>> {
        let ids: Vec<ProductId> = sqlx::query_scalar(
            "SELECT product_id FROM catalog_products WHERE catalog_id = ?1 ORDER BY rowid",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Inserts a new catalog and its product links in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - One of the product ids doesn't exist
    pub async fn insert(&self, catalog: &Catalog) -> DbResult<Catalog> {
        debug!(id = %catalog.id, products = catalog.product_ids.len(), "Inserting catalog");

        let mut catalog = catalog.clone();
        catalog.product_ids = dedup(&catalog.product_ids);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO catalogs (id, name, file_path, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(catalog.id.as_str())
        .bind(&catalog.name)
        .bind(&catalog.file_path)
        .bind(catalog.status.as_str())
        .bind(catalog.created_at)
        .bind(catalog.updated_at)
        .execute(&mut *tx)
        .await?;

        replace_links(&mut *tx, &catalog.id, &catalog.product_ids).await?;

        tx.commit().await?;

        info!(id = %catalog.id, "Catalog created");
        Ok(catalog)
    }

    /// Updates a catalog and replaces its product list.
    pub async fn update(&self, catalog: &Catalog) -> DbResult<Catalog> {
        debug!(id = %catalog.id, "Updating catalog");

        let mut catalog = catalog.clone();
        catalog.product_ids = dedup(&catalog.product_ids);
        catalog.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE catalogs SET
                name = ?2,
                file_path = ?3,
                status = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(catalog.id.as_str())
        .bind(&catalog.name)
        .bind(&catalog.file_path)
        .bind(catalog.status.as_str())
        .bind(catalog.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Catalog", &catalog.id));
        }

        replace_links(&mut *tx, &catalog.id, &catalog.product_ids).await?;

        tx.commit().await?;

        info!(id = %catalog.id, "Catalog updated");
        Ok(catalog)
    }

    /// Changes the status of a catalog.
    pub async fn set_status(&self, id: &CatalogId, status: RecordStatus) -> DbResult<Catalog> {
        let result = sqlx::query("UPDATE catalogs SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.as_str())
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Catalog", id));
        }

        self.require(id).await
    }

    /// Deletes a catalog and its product links.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Catalog doesn't exist
    /// * `CoreError::StillReferenced` - Suppliers still reference it (409)
    pub async fn delete(&self, id: &CatalogId) -> DbResult<()> {
        debug!(id = %id, "Deleting catalog");

        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM catalogs WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Catalog", id));
        }

        let suppliers = count(
            &mut *tx,
            "SELECT COUNT(*) FROM suppliers WHERE catalog_id = ?1",
            id.as_str(),
        )
        .await?;

        if suppliers > 0 {
            warn!(id = %id, suppliers, "Refusing to delete referenced catalog");
            return Err(CoreError::StillReferenced {
                entity: "Catalog",
                id: id.to_string(),
                referrer: "suppliers",
                count: suppliers,
            }
            .into());
        }

        sqlx::query("DELETE FROM catalog_products WHERE catalog_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM catalogs WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Catalog deleted");
        Ok(())
    }

    /// Resolves the products of a catalog, in list order.
    pub async fn products(&self, id: &CatalogId) -> DbResult<Vec<Product>> {
        self.require(id).await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                p.id, p.name, p.category_id, p.purchase_unit, p.quantity_included,
                p.sale_unit, p.purchase_price_cents, p.sale_price_cents, p.stock,
                p.status, p.created_at, p.updated_at
            FROM catalog_products cp
            INNER JOIN products p ON p.id = cp.product_id
            WHERE cp.catalog_id = ?1
            ORDER BY cp.rowid
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Adds a product to a catalog. Adding it twice is a no-op.
    pub async fn add_product(&self, id: &CatalogId, product_id: &ProductId) -> DbResult<Catalog> {
        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM catalogs WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Catalog", id));
        }
        ensure_product(&mut *tx, product_id).await?;

        let added = sqlx::query(
            "INSERT OR IGNORE INTO catalog_products (catalog_id, product_id) VALUES (?1, ?2)",
        )
        .bind(id.as_str())
        .bind(product_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        touch(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, product_id = %product_id, added, "Product assigned to catalog");
        self.require(id).await
    }

    /// Removes a product from a catalog.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Catalog doesn't exist, or product not in it
    pub async fn remove_product(
        &self,
        id: &CatalogId,
        product_id: &ProductId,
    ) -> DbResult<Catalog> {
        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM catalogs WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Catalog", id));
        }

        let removed = sqlx::query(
            "DELETE FROM catalog_products WHERE catalog_id = ?1 AND product_id = ?2",
        )
        .bind(id.as_str())
        .bind(product_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            return Err(DbError::not_found("Catalog product", product_id));
        }

        touch(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id = %id, product_id = %product_id, "Product removed from catalog");
        self.require(id).await
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

fn dedup(ids: &[ProductId]) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

async fn ensure_product(conn: &mut SqliteConnection, product_id: &ProductId) -> DbResult<()> {
    if count(&mut *conn, "SELECT COUNT(*) FROM products WHERE id = ?1", product_id.as_str()).await?
        == 0
    {
        return Err(DbError::not_found("Product", product_id));
    }
    Ok(())
}

async fn replace_links(
    conn: &mut SqliteConnection,
    id: &CatalogId,
    product_ids: &[ProductId],
) -> DbResult<()> {
    sqlx::query("DELETE FROM catalog_products WHERE catalog_id = ?1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;

    for product_id in product_ids {
        ensure_product(&mut *conn, product_id).await?;

        sqlx::query("INSERT INTO catalog_products (catalog_id, product_id) VALUES (?1, ?2)")
            .bind(id.as_str())
            .bind(product_id.as_str())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn touch(conn: &mut SqliteConnection, id: &CatalogId) -> DbResult<()> {
    sqlx::query("UPDATE catalogs SET updated_at = ?2 WHERE id = ?1")
        .bind(id.as_str())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
