//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! This crate holds the domain of the inventory/sales backend as plain
//! types and pure functions. Nothing in here touches a database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/api (Axum HTTP handlers)                   │   │
//! │  │   /api/categories  /api/products  /api/sales  ...               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │   ids   │ │  types  │ │  money  │ │ pricing │ │validation│ │   │
//! │  │   │ProductId│ │ Product │ │  Money  │ │ totals  │ │  rules   │ │   │
//! │  │   │ SaleId  │ │  Sale   │ │         │ │ margins │ │  checks  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               stockroom-db (Database Layer)                     │   │
//! │  │         SQLite queries, migrations, repositories                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - One identifier newtype per entity
//! - [`types`] - Entities (Category, Product, Client, Catalog, Supplier, Sale, Notification)
//! - [`report`] - Read-only aggregation rows
//! - [`money`] - Integer-cents money type
//! - [`pricing`] - Line totals, sale totals, price adjustments, margins
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::types::Percentage;
//!
//! let price = Money::from_cents(10_000);
//! let raised = price.apply_percentage_increase(Percentage::from_bps(1_000));
//! assert_eq!(raised.map(|m| m.cents()), Some(11_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ids::*;
pub use money::Money;
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock level at or below which a product counts as low on stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Number of clients returned by the top-clients ranking when no limit is given.
pub const DEFAULT_TOP_CLIENTS_LIMIT: i64 = 5;

/// Upper bound for the top-clients limit.
pub const MAX_TOP_CLIENTS_LIMIT: i64 = 100;

/// Maximum line items accepted in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typing mistakes (an extra zero or two) on wholesale orders.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Largest accepted price in cents (100,000,000.00).
///
/// Keeps every line total, sale total and margin product inside i64.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Largest accepted stock level, and largest single stock adjustment.
pub const MAX_STOCK: i64 = 100_000_000;

/// Largest accepted client credit, and largest single credit adjustment.
pub const MAX_CREDIT_CENTS: i64 = 1_000_000_000_000;

/// Largest accepted bulk price increase, in percent.
pub const MAX_PRICE_INCREASE_PERCENT: f64 = 1_000.0;
