//! # Supplier Repository
//!
//! Database operations for suppliers and their optional catalog relation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::count;
use stockroom_core::{CatalogId, RecordStatus, Supplier, SupplierId, SupplierSummary};

const SUPPLIER_COLUMNS: &str = "id, id_number, company, contact_name, phone, bank_account, \
     bank_name, catalog_id, status, created_at, updated_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists all suppliers ordered by company.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY company, id");

        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Gets a supplier by its ID.
    pub async fn get_by_id(&self, id: &SupplierId) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");

        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Gets a supplier or fails with NotFound.
    pub async fn require(&self, id: &SupplierId) -> DbResult<Supplier> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Inserts a new supplier.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - `catalog_id` is set but the catalog doesn't exist
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<Supplier> {
        debug!(id = %supplier.id, company = %supplier.company, "Inserting supplier");

        if let Some(catalog_id) = &supplier.catalog_id {
            self.ensure_catalog(catalog_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, id_number, company, contact_name, phone, bank_account, bank_name,
                catalog_id, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(supplier.id.as_str())
        .bind(&supplier.id_number)
        .bind(&supplier.company)
        .bind(&supplier.contact_name)
        .bind(&supplier.phone)
        .bind(&supplier.bank_account)
        .bind(&supplier.bank_name)
        .bind(supplier.catalog_id.as_ref().map(CatalogId::as_str))
        .bind(supplier.status.as_str())
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, "Supplier created");
        Ok(supplier.clone())
    }

    /// Updates an existing supplier (catalog relation included).
    pub async fn update(&self, supplier: &Supplier) -> DbResult<Supplier> {
        debug!(id = %supplier.id, "Updating supplier");

        if let Some(catalog_id) = &supplier.catalog_id {
            self.ensure_catalog(catalog_id).await?;
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                id_number = ?2,
                company = ?3,
                contact_name = ?4,
                phone = ?5,
                bank_account = ?6,
                bank_name = ?7,
                catalog_id = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(supplier.id.as_str())
        .bind(&supplier.id_number)
        .bind(&supplier.company)
        .bind(&supplier.contact_name)
        .bind(&supplier.phone)
        .bind(&supplier.bank_account)
        .bind(&supplier.bank_name)
        .bind(supplier.catalog_id.as_ref().map(CatalogId::as_str))
        .bind(supplier.status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        info!(id = %supplier.id, "Supplier updated");
        Ok(Supplier {
            updated_at: now,
            ..supplier.clone()
        })
    }

    /// Changes the status of a supplier.
    pub async fn set_status(&self, id: &SupplierId, status: RecordStatus) -> DbResult<Supplier> {
        let mut supplier = self.require(id).await?;
        supplier.status = status;
        self.update(&supplier).await
    }

    /// Links a supplier to a catalog (`Some`) or removes the link (`None`).
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Supplier or catalog doesn't exist
    pub async fn set_catalog(
        &self,
        id: &SupplierId,
        catalog_id: Option<CatalogId>,
    ) -> DbResult<Supplier> {
        let mut supplier = self.require(id).await?;
        supplier.catalog_id = catalog_id;

        let supplier = self.update(&supplier).await?;
        info!(
            id = %id,
            catalog_id = ?supplier.catalog_id.as_ref().map(CatalogId::as_str),
            "Supplier catalog changed"
        );
        Ok(supplier)
    }

    /// Deletes a supplier.
    pub async fn delete(&self, id: &SupplierId) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        info!(id = %id, "Supplier deleted");
        Ok(())
    }

    /// Suppliers grouped by catalog, largest group first.
    ///
    /// Suppliers without a catalog form one group with a `None` catalog.
    pub async fn summary(&self) -> DbResult<Vec<SupplierSummary>> {
        let rows = sqlx::query_as::<_, SupplierSummary>(
            r#"
            SELECT
                s.catalog_id AS catalog_id,
                c.name AS catalog_name,
                COUNT(*) AS supplier_count
            FROM suppliers s
            LEFT JOIN catalogs c ON c.id = s.catalog_id
            GROUP BY s.catalog_id, c.name
            ORDER BY supplier_count DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn ensure_catalog(&self, catalog_id: &CatalogId) -> DbResult<()> {
        if count(&self.pool, "SELECT COUNT(*) FROM catalogs WHERE id = ?1", catalog_id.as_str()).await?
            == 0
        {
            return Err(DbError::not_found("Catalog", catalog_id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use crate::Database;
    use stockroom_core::{Catalog, CoreError};

    fn new_supplier(company: &str, catalog_id: Option<CatalogId>) -> Supplier {
        let now = Utc::now();
        Supplier {
            id: SupplierId::generate(),
            id_number: "30-71234567-1".to_string(),
            company: company.to_string(),
            contact_name: "Luis".to_string(),
            phone: "555-0200".to_string(),
            bank_account: "0001-0002".to_string(),
            bank_name: "First Bank".to_string(),
            catalog_id,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_catalog(db: &Database, name: &str) -> Catalog {
        let now = Utc::now();
        db.catalogs()
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

    #[tokio::test]
    async fn test_create_then_get() {
        let db = test_db().await;
        let created = db
            .suppliers()
            .insert(&new_supplier("Acme", None))
            .await
            .unwrap();

        let fetched = db.suppliers().require(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_with_missing_catalog() {
        let db = test_db().await;
        let err = db
            .suppliers()
            .insert(&new_supplier("Acme", Some(CatalogId::generate())))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_assign_and_remove_catalog() {
        let db = test_db().await;
        let catalog = seed_catalog(&db, "Main").await;
        let supplier = db
            .suppliers()
            .insert(&new_supplier("Acme", None))
            .await
            .unwrap();

        let linked = db
            .suppliers()
            .set_catalog(&supplier.id, Some(catalog.id.clone()))
            .await
            .unwrap();
        assert_eq!(linked.catalog_id, Some(catalog.id.clone()));

        // Linked catalogs cannot be deleted
        assert!(matches!(
            db.catalogs().delete(&catalog.id).await,
            Err(DbError::Domain(CoreError::StillReferenced { .. }))
        ));

        let unlinked = db.suppliers().set_catalog(&supplier.id, None).await.unwrap();
        assert_eq!(unlinked.catalog_id, None);
        assert_eq!(unlinked.company, "Acme");
    }

    #[tokio::test]
    async fn test_summary_groups_by_catalog() {
        let db = test_db().await;
        let catalog = seed_catalog(&db, "Main").await;
        for company in ["A", "B"] {
            db.suppliers()
                .insert(&new_supplier(company, Some(catalog.id.clone())))
                .await
                .unwrap();
        }
        db.suppliers()
            .insert(&new_supplier("C", None))
            .await
            .unwrap();

        let summary = db.suppliers().summary().await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].catalog_id, Some(catalog.id.clone()));
        assert_eq!(summary[0].catalog_name.as_deref(), Some("Main"));
        assert_eq!(summary[0].supplier_count, 2);
        assert_eq!(summary[1].catalog_id, None);
        assert_eq!(summary[1].supplier_count, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let supplier = db
            .suppliers()
            .insert(&new_supplier("Acme", None))
            .await
            .unwrap();

        db.suppliers().delete(&supplier.id).await.unwrap();
        assert!(db.suppliers().get_by_id(&supplier.id).await.unwrap().is_none());
        assert!(matches!(
            db.suppliers().delete(&supplier.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
