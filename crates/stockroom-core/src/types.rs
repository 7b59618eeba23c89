//! # Domain Types
//!
//! Entities stored by the backend and the small value types they use.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Entities                                 │
//! │                                                                         │
//! │  ┌──────────────┐      ┌──────────────┐      ┌──────────────┐          │
//! │  │   Category   │◄─────│   Product    │─────►│   Catalog    │          │
//! │  │  name        │  FK  │  categoryId  │  M:N │  productIds  │          │
//! │  │  status      │      │  prices      │      │  filePath    │          │
//! │  └──────────────┘      │  stock ≥ 0   │      └──────▲───────┘          │
//! │                        └──────▲───────┘             │ FK (optional)    │
//! │                               │ FK                  │                  │
//! │  ┌──────────────┐      ┌──────┴───────┐      ┌──────┴───────┐          │
//! │  │    Client    │◄─────│     Sale     │      │   Supplier   │          │
//! │  │  credit ≥ 0  │  FK  │  items[]     │      │  catalogId   │          │
//! │  └──────────────┘      │  totals      │      └──────────────┘          │
//! │                        └──────────────┘                                 │
//! │                                                                         │
//! │  ┌──────────────┐                                                       │
//! │  │ Notification │  (standalone; low-stock ones carry a productId)      │
//! │  └──────────────┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys are plain identifier columns. Nothing below the application
//! enforces them; repositories check existence explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::ids::{
    CatalogId, CategoryId, ClientId, NotificationId, ProductId, SaleId, SaleItemId, SupplierId,
};
use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a (non-negative) percent value, rounding to
    /// the nearest basis point.
    pub fn from_percent(pct: f64) -> Self {
        Percentage((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the value in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the value as a percent (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

// =============================================================================
// Record Status
// =============================================================================

/// Lifecycle flag shared by every managed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 2] = [RecordStatus::Active, RecordStatus::Inactive];

    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: RecordStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Builds a new active category with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Category {
            id: CategoryId::generate(),
            name: name.into(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product held in stock.
///
/// Bought in `purchase_unit` (e.g. a box) containing `quantity_included`
/// `sale_unit`s (e.g. 12 bottles). The purchase price is per purchase unit,
/// the sale price per sale unit, and `stock` counts sale units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub purchase_unit: String,
    pub quantity_included: i64,
    pub sale_unit: String,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    /// Units on hand. Never negative.
    pub stock: i64,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Checks whether the product is at or below `threshold`.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer that buys on the books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: ClientId,
    pub tax_id: String,
    pub full_name: String,
    pub address: String,
    /// Free-text references (who recommended the client, landmarks, ...).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "reference_notes"))]
    pub references: String,
    pub phone: String,
    pub email: String,
    /// Available credit. Never negative.
    pub credit_cents: i64,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn credit(&self) -> Money {
        Money::from_cents(self.credit_cents)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A named collection of product references plus the path of its source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Catalog {
    pub id: CatalogId,
    pub name: String,
    pub file_path: String,
    /// Loaded from `catalog_products`, not a column.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub product_ids: Vec<ProductId>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier, optionally linked to the catalog it publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: SupplierId,
    pub id_number: String,
    pub company: String,
    pub contact_name: String,
    pub phone: String,
    pub bank_account: String,
    pub bank_name: String,
    pub catalog_id: Option<CatalogId>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale to a client.
///
/// Totals are always computed server-side from the items, see
/// [`crate::pricing::SaleTotals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: SaleId,
    pub client_id: ClientId,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Loaded from `sale_items`, not a column.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub discount_bps: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the discount as a percentage.
    pub fn discount(&self) -> Percentage {
        Percentage::from_bps(self.discount_bps.clamp(0, u32::MAX as i64) as u32)
    }
}

/// A line in a sale.
/// Uses snapshot pattern: the product name is frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: SaleItemId,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// One requested line of a sale, already validated for shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    /// `None` means "use the product's current sale price".
    pub unit_price_cents: Option<i64>,
}

/// A validated request to record a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub client_id: ClientId,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub discount: Percentage,
    pub items: Vec<SaleLineRequest>,
    /// Check and decrement product stock for each line.
    pub adjust_stock: bool,
}

// =============================================================================
// Notification
// =============================================================================

/// Kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    LowStock,
    Sale,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Info,
        NotificationKind::Warning,
        NotificationKind::LowStock,
        NotificationKind::Sale,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::LowStock => "low_stock",
            NotificationKind::Sale => "sale",
        }
    }
}

impl Default for NotificationKind {
    fn default() -> Self {
        NotificationKind::Info
    }
}

impl FromStr for NotificationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: NotificationKind::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
    }
}

/// A message shown in the back-office inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub id: NotificationId,
    pub icon: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Product the notification is about, if any.
    pub product_id: Option<ProductId>,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "is_read"))]
    pub read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Builds the low-stock notification for `product`.
    pub fn low_stock(product: &Product) -> Self {
        let now = Utc::now();
        Notification {
            id: NotificationId::generate(),
            icon: "warning".to_string(),
            message: format!(
                "Low stock: {} has {} {} left",
                product.name, product.stock, product.sale_unit
            ),
            kind: NotificationKind::LowStock,
            product_id: Some(product.id.clone()),
            date: now,
            read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
