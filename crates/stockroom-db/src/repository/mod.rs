//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.categories().merge(&source, &target)                       │
//! │       ▼                                                                 │
//! │  CategoryRepository                                                    │
//! │  ├── list / get_by_id / insert / update / delete                       │
//! │  └── entity-specific operations (merge, bulk price update, summary)    │
//! │       │                                                                 │
//! │       │  SQL (single statement, or one transaction for multi-row)      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`] - Categories, merge, bulk price update, summary
//! - [`ProductRepository`] - Products, stock adjustment, low stock, counts
//! - [`ClientRepository`] - Clients, credit adjustment, top clients
//! - [`CatalogRepository`] - Catalogs and their product lists
//! - [`SupplierRepository`] - Suppliers, catalog relation, summary
//! - [`SaleRepository`] - Sales with items, stock-checked creation, cancellation
//! - [`NotificationRepository`] - Notifications, read state, low-stock alerts

pub mod catalog;
pub mod category;
pub mod client;
pub mod notification;
pub mod product;
pub mod sale;
pub mod supplier;

pub use catalog::CatalogRepository;
pub use category::CategoryRepository;
pub use client::ClientRepository;
pub use notification::NotificationRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
pub use supplier::SupplierRepository;

use sqlx::{Executor, Sqlite};

use crate::error::DbResult;

/// Runs a `SELECT COUNT(*) ... WHERE <col> = ?1` style query.
///
/// Works on the pool and inside a transaction (`&mut *tx`).
pub(crate) async fn count<'e, E>(executor: E, sql: &'static str, id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}
