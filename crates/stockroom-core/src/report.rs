//! # Report Rows
//!
//! Read-only aggregation results returned by the summary endpoints.
//! Rows are produced by `GROUP BY` queries in stockroom-db, except
//! [`ProductProfit`] which is computed by [`crate::pricing::product_profit`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CatalogId, CategoryId, ClientId, ProductId};

/// Per-category inventory summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategorySummary {
    pub category_id: CategoryId,
    pub name: String,
    pub product_count: i64,
    /// Sum of `stock` over the category's products.
    pub total_stock: i64,
    /// Σ stock × unit cost, in cents.
    pub inventory_value_cents: i64,
}

/// Suppliers grouped by the catalog they are linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierSummary {
    /// `None` groups suppliers without a catalog.
    pub catalog_id: Option<CatalogId>,
    pub catalog_name: Option<String>,
    pub supplier_count: i64,
}

/// A client ranked by how much they purchased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopClient {
    pub client_id: ClientId,
    pub full_name: String,
    pub sale_count: i64,
    pub total_purchased_cents: i64,
}

/// Product counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub out_of_stock: i64,
}

/// Sales totals over all recorded sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub revenue_cents: i64,
    /// Revenue / sale count, rounded half-up; 0 when there are no sales.
    pub average_ticket_cents: i64,
}

impl SalesSummary {
    pub fn new(sale_count: i64, revenue_cents: i64) -> Self {
        let average_ticket_cents = if sale_count > 0 {
            (revenue_cents + sale_count / 2) / sale_count
        } else {
            0
        };

        SalesSummary {
            sale_count,
            revenue_cents,
            average_ticket_cents,
        }
    }
}

/// Profitability of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductProfit {
    pub product_id: ProductId,
    pub name: String,
    pub unit_cost_cents: i64,
    pub sale_price_cents: i64,
    pub unit_margin_cents: i64,
    /// Margin relative to unit cost, in basis points.
    pub margin_bps: Option<i64>,
    pub stock: i64,
    pub potential_profit_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_summary_average() {
        let summary = SalesSummary::new(3, 1000);
        assert_eq!(summary.average_ticket_cents, 333);

        let summary = SalesSummary::new(2, 1001);
        assert_eq!(summary.average_ticket_cents, 501);

        assert_eq!(SalesSummary::new(0, 0).average_ticket_cents, 0);
    }
}
