//! # Client Repository
//!
//! Database operations for clients: CRUD, guarded credit adjustment and the
//! top-clients ranking.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::count;
use stockroom_core::{
    Client, ClientId, CoreError, Money, RecordStatus, TopClient, MAX_CREDIT_CENTS,
};

const CLIENT_COLUMNS: &str = "id, tax_id, full_name, address, reference_notes, phone, email, \
     credit_cents, status, created_at, updated_at";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists all clients ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY full_name, id");

        let clients = sqlx::query_as::<_, Client>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Gets a client by its ID.
    pub async fn get_by_id(&self, id: &ClientId) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1");

        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    /// Gets a client or fails with NotFound.
    pub async fn require(&self, id: &ClientId) -> DbResult<Client> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Inserts a new client.
    pub async fn insert(&self, client: &Client) -> DbResult<Client> {
        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, tax_id, full_name, address, reference_notes, phone, email,
                credit_cents, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(client.id.as_str())
        .bind(&client.tax_id)
        .bind(&client.full_name)
        .bind(&client.address)
        .bind(&client.references)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(client.credit_cents)
        .bind(client.status.as_str())
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %client.id, "Client created");
        Ok(client.clone())
    }

    /// Updates an existing client.
    pub async fn update(&self, client: &Client) -> DbResult<Client> {
        debug!(id = %client.id, "Updating client");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                tax_id = ?2,
                full_name = ?3,
                address = ?4,
                reference_notes = ?5,
                phone = ?6,
                email = ?7,
                credit_cents = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(client.id.as_str())
        .bind(&client.tax_id)
        .bind(&client.full_name)
        .bind(&client.address)
        .bind(&client.references)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(client.credit_cents)
        .bind(client.status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        info!(id = %client.id, "Client updated");
        Ok(Client {
            updated_at: now,
            ..client.clone()
        })
    }

    /// Changes the status of a client.
    pub async fn set_status(&self, id: &ClientId, status: RecordStatus) -> DbResult<Client> {
        let mut client = self.require(id).await?;
        client.status = status;
        self.update(&client).await
    }

    /// Adds `delta_cents` to the client's credit.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Client doesn't exist
    /// * `CoreError::InvalidOperation` - Credit would go below zero or above
    ///   [`MAX_CREDIT_CENTS`]
    pub async fn adjust_credit(&self, id: &ClientId, delta_cents: i64) -> DbResult<Client> {
        debug!(id = %id, delta_cents, "Adjusting credit");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE clients
            SET
                credit_cents = credit_cents + ?2,
                updated_at = ?3
            WHERE id = ?1 AND credit_cents + ?2 >= 0 AND credit_cents + ?2 <= ?4
            "#,
        )
        .bind(id.as_str())
        .bind(delta_cents)
        .bind(now)
        .bind(MAX_CREDIT_CENTS)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let client = self.require(id).await?;
            warn!(id = %id, credit_cents = client.credit_cents, delta_cents, "Credit adjustment rejected");

            if delta_cents > 0 {
                return Err(CoreError::InvalidOperation(format!(
                    "credit cannot exceed {} (available {}, change {})",
                    Money::from_cents(MAX_CREDIT_CENTS),
                    client.credit(),
                    delta_cents
                ))
                .into());
            }
            return Err(CoreError::InvalidOperation(format!(
                "credit cannot go below zero (available {}, change {})",
                client.credit(),
                delta_cents
            ))
            .into());
        }

        let client = self.require(id).await?;
        info!(id = %id, credit_cents = client.credit_cents, "Credit adjusted");
        Ok(client)
    }

    /// Deletes a client.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Client doesn't exist
    /// * `CoreError::StillReferenced` - Sales still reference the client (409)
    pub async fn delete(&self, id: &ClientId) -> DbResult<()> {
        debug!(id = %id, "Deleting client");

        let mut tx = self.pool.begin().await?;

        if count(&mut *tx, "SELECT COUNT(*) FROM clients WHERE id = ?1", id.as_str()).await? == 0 {
            return Err(DbError::not_found("Client", id));
        }

        let sales = count(&mut *tx, "SELECT COUNT(*) FROM sales WHERE client_id = ?1", id.as_str()).await?;

        if sales > 0 {
            warn!(id = %id, sales, "Refusing to delete referenced client");
            return Err(CoreError::StillReferenced {
                entity: "Client",
                id: id.to_string(),
                referrer: "sales",
                count: sales,
            }
            .into());
        }

        sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Client deleted");
        Ok(())
    }

    /// Ranks clients by total purchased, largest first.
    ///
    /// Only clients with at least one sale appear.
    pub async fn top(&self, limit: i64) -> DbResult<Vec<TopClient>> {
        let rows = sqlx::query_as::<_, TopClient>(
            r#"
            SELECT
                c.id AS client_id,
                c.full_name AS full_name,
                COUNT(s.id) AS sale_count,
                COALESCE(SUM(s.total_cents), 0) AS total_purchased_cents
            FROM clients c
            INNER JOIN sales s ON s.client_id = c.id
            GROUP BY c.id, c.full_name
            ORDER BY total_purchased_cents DESC, sale_count DESC, c.full_name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(limit, count = rows.len(), "Top clients");
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_client, test_db};

    #[tokio::test]
    async fn test_create_then_get() {
        let db = test_db().await;
        let created = seed_client(&db, "Ana Perez").await;

        let fetched = db.clients().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_keeps_other_fields() {
        let db = test_db().await;
        let mut client = seed_client(&db, "Ana Perez").await;

        client.phone = "555-0199".to_string();
        db.clients().update(&client).await.unwrap();

        let fetched = db.clients().require(&client.id).await.unwrap();
        assert_eq!(fetched.phone, "555-0199");
        assert_eq!(fetched.full_name, "Ana Perez");
        assert_eq!(fetched.email, "client@example.com");
    }

    #[tokio::test]
    async fn test_adjust_credit() {
        let db = test_db().await;
        let client = seed_client(&db, "Ana Perez").await;

        let client = db.clients().adjust_credit(&client.id, 5_000).await.unwrap();
        assert_eq!(client.credit_cents, 5_000);

        let client = db.clients().adjust_credit(&client.id, -2_000).await.unwrap();
        assert_eq!(client.credit_cents, 3_000);

        let err = db.clients().adjust_credit(&client.id, -3_001).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidOperation(_))));
        assert_eq!(db.clients().require(&client.id).await.unwrap().credit_cents, 3_000);
    }

    #[tokio::test]
    async fn test_adjust_credit_extremes_leave_row_intact() {
        let db = test_db().await;
        let client = seed_client(&db, "Ana Perez").await;
        db.clients().adjust_credit(&client.id, 1_000).await.unwrap();

        for delta in [i64::MAX, MAX_CREDIT_CENTS, i64::MIN] {
            let err = db.clients().adjust_credit(&client.id, delta).await.unwrap_err();
            assert!(matches!(err, DbError::Domain(CoreError::InvalidOperation(_))));
        }

        let listed = db.clients().list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].credit_cents, 1_000);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let client = seed_client(&db, "Ana Perez").await;

        db.clients().delete(&client.id).await.unwrap();
        assert!(db.clients().get_by_id(&client.id).await.unwrap().is_none());
        assert!(db.clients().list().await.unwrap().is_empty());

        assert!(matches!(
            db.clients().delete(&client.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_top_without_sales_is_empty() {
        let db = test_db().await;
        seed_client(&db, "Ana Perez").await;

        assert!(db.clients().top(5).await.unwrap().is_empty());
    }
}
