//! # Notification Repository
//!
//! Back-office inbox: CRUD, read state and low-stock alert generation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::PRODUCT_COLUMNS;
use stockroom_core::{Notification, NotificationId, Product, ProductId};

const NOTIFICATION_COLUMNS: &str =
    "id, icon, message, kind, product_id, date, is_read, created_at, updated_at";

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Lists notifications newest first.
    pub async fn list(&self, unread_only: bool) -> DbResult<Vec<Notification>> {
        let filter = if unread_only { "WHERE is_read = 0" } else { "" };
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications {filter} ORDER BY date DESC, id"
        );

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    pub async fn get_by_id(&self, id: &NotificationId) -> DbResult<Option<Notification>> {
        let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");

        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(notification)
    }

    pub async fn require(&self, id: &NotificationId) -> DbResult<Notification> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Notification", id))
    }

    pub async fn insert(&self, notification: &Notification) -> DbResult<Notification> {
        debug!(id = %notification.id, kind = notification.kind.as_str(), "Inserting notification");

        insert_notification(&self.pool, notification).await?;

        info!(id = %notification.id, "Notification created");
        Ok(notification.clone())
    }

    pub async fn update(&self, notification: &Notification) -> DbResult<Notification> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE notifications SET
                icon = ?2,
                message = ?3,
                kind = ?4,
                product_id = ?5,
                date = ?6,
                is_read = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(notification.id.as_str())
        .bind(&notification.icon)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .bind(notification.product_id.as_ref().map(ProductId::as_str))
        .bind(notification.date)
        .bind(notification.read)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", &notification.id));
        }

        info!(id = %notification.id, "Notification updated");
        Ok(Notification {
            updated_at: now,
            ..notification.clone()
        })
    }

    /// Marks one notification as read.
    pub async fn mark_read(&self, id: &NotificationId) -> DbResult<Notification> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1, updated_at = ?2 WHERE id = ?1")
                .bind(id.as_str())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        self.require(id).await
    }

    /// Marks every unread notification as read.
    ///
    /// ## Returns
    /// Number of notifications that changed.
    pub async fn mark_all_read(&self) -> DbResult<u64> {
        let updated =
            sqlx::query("UPDATE notifications SET is_read = 1, updated_at = ?1 WHERE is_read = 0")
                .bind(Utc::now())
                .execute(&self.pool)
                .await?
                .rows_affected();

        info!(updated, "Notifications marked read");
        Ok(updated)
    }

    pub async fn unread_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: &NotificationId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        info!(id = %id, "Notification deleted");
        Ok(())
    }

    /// Creates one `low_stock` notification per product with
    /// `stock <= threshold`, in one transaction.
    ///
    /// ## Returns
    /// The created notifications, lowest stock first.
    pub async fn generate_low_stock(&self, threshold: i64) -> DbResult<Vec<Notification>> {
        debug!(threshold, "Generating low-stock notifications");

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ?1 ORDER BY stock, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(products.len());
        for product in &products {
            let notification = Notification::low_stock(product);
            insert_notification(&mut *tx, &notification).await?;
            created.push(notification);
        }

        tx.commit().await?;

        info!(threshold, created = created.len(), "Low-stock notifications generated");
        Ok(created)
    }
}

async fn insert_notification<'e, E>(executor: E, notification: &Notification) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO notifications (
            id, icon, message, kind, product_id, date, is_read, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(notification.id.as_str())
    .bind(&notification.icon)
    .bind(&notification.message)
    .bind(notification.kind.as_str())
    .bind(notification.product_id.as_ref().map(ProductId::as_str))
    .bind(notification.date)
    .bind(notification.read)
    .bind(notification.created_at)
    .bind(notification.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
