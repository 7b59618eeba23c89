//! # Pricing
//!
//! Sale arithmetic and product margins. All math in integer cents.
//!
//! ## Sale Totals
//! ```text
//! items ──► line_total = quantity × unit_price   (per line)
//!              │
//!              ▼
//!           subtotal = Σ line_total
//!              │
//!              ▼
//!           discount = round_half_up(subtotal × bps / 10000)
//!              │
//!              ▼
//!           total    = subtotal − discount
//! ```

use crate::error::{CoreError, CoreResult};
use crate::ids::{SaleId, SaleItemId};
use crate::money::Money;
use crate::report::ProductProfit;
use crate::types::{Percentage, Product, Sale, SaleItem};
use crate::MAX_PRICE_CENTS;

/// Basis points in 100%.
const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Sale Lines
// =============================================================================

fn overflow(what: &str) -> CoreError {
    CoreError::InvalidOperation(format!("{what} is too large"))
}

/// Builds the line item snapshot for `product`.
///
/// `unit_price_cents` falls back to the product's current sale price.
///
/// ## Errors
/// * `CoreError::InvalidOperation` - quantity × price does not fit in cents
pub fn line_item(
    sale_id: &SaleId,
    product: &Product,
    quantity: i64,
    unit_price_cents: Option<i64>,
) -> CoreResult<SaleItem> {
    let unit_price = Money::from_cents(unit_price_cents.unwrap_or(product.sale_price_cents));
    let line_total = unit_price
        .multiply_quantity(quantity)
        .ok_or_else(|| overflow("line total"))?;

    Ok(SaleItem {
        id: SaleItemId::generate(),
        sale_id: sale_id.clone(),
        product_id: product.id.clone(),
        name: product.name.clone(),
        quantity,
        unit_price_cents: unit_price.cents(),
        line_total_cents: line_total.cents(),
    })
}

/// Totals of a sale, derived from its lines and discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes totals from the line items and a discount percentage.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::pricing::SaleTotals;
    /// use stockroom_core::types::Percentage;
    /// use stockroom_core::Money;
    ///
    /// let totals = SaleTotals::from_line_totals(
    ///     [Money::from_cents(1000), Money::from_cents(500)],
    ///     Percentage::from_bps(1000),
    /// )
    /// .unwrap();
    /// assert_eq!(totals.subtotal.cents(), 1500);
    /// assert_eq!(totals.discount.cents(), 150);
    /// assert_eq!(totals.total.cents(), 1350);
    /// ```
    ///
    /// ## Errors
    /// * `CoreError::InvalidOperation` - the subtotal does not fit in cents
    pub fn from_line_totals(
        line_totals: impl IntoIterator<Item = Money>,
        discount: Percentage,
    ) -> CoreResult<Self> {
        let subtotal = Money::checked_sum(line_totals).ok_or_else(|| overflow("sale subtotal"))?;
        let discount_amount = subtotal
            .percentage_of(discount)
            .ok_or_else(|| overflow("sale discount"))?;
        let total = subtotal
            .checked_sub(discount_amount)
            .ok_or_else(|| overflow("sale total"))?;

        Ok(SaleTotals {
            subtotal,
            discount: discount_amount,
            total,
        })
    }

    pub fn for_items(items: &[SaleItem], discount: Percentage) -> CoreResult<Self> {
        Self::from_line_totals(items.iter().map(SaleItem::line_total), discount)
    }
}

/// Recomputes and stores the totals of `sale` for the given discount.
pub fn apply_discount(sale: &mut Sale, discount: Percentage) -> CoreResult<()> {
    let totals = SaleTotals::for_items(&sale.items, discount)?;
    sale.discount_bps = discount.bps() as i64;
    sale.subtotal_cents = totals.subtotal.cents();
    sale.discount_cents = totals.discount.cents();
    sale.total_cents = totals.total.cents();
    Ok(())
}

// =============================================================================
// Price Adjustments
// =============================================================================

/// New sale price after a bulk increase.
///
/// ## Errors
/// * `CoreError::InvalidOperation` - the new price exceeds [`MAX_PRICE_CENTS`]
pub fn increased_price(sale_price_cents: i64, increase: Percentage) -> CoreResult<i64> {
    Money::from_cents(sale_price_cents)
        .apply_percentage_increase(increase)
        .map(|price| price.cents())
        .filter(|cents| *cents <= MAX_PRICE_CENTS)
        .ok_or_else(|| {
            CoreError::InvalidOperation(format!(
                "increased price would exceed the maximum of {}",
                Money::from_cents(MAX_PRICE_CENTS)
            ))
        })
}

// =============================================================================
// Margins
// =============================================================================

/// Purchase cost of one sale unit, rounded half-up to the cent.
pub fn unit_cost(product: &Product) -> Money {
    let per = product.quantity_included.max(1);
    Money::from_cents(product.purchase_price_cents.saturating_add(per / 2) / per)
}

/// Profitability of a product at its current prices and stock.
///
/// - unit margin = sale price − purchase price / quantity included
/// - margin bps  = unit margin relative to unit cost (absent if cost is 0)
/// - potential   = unit margin × stock
pub fn product_profit(product: &Product) -> CoreResult<ProductProfit> {
    let cost = unit_cost(product);
    let margin = product
        .sale_price()
        .checked_sub(cost)
        .ok_or_else(|| overflow("unit margin"))?;

    let margin_bps = if cost.is_positive() {
        Some(
            margin
                .cents()
                .checked_mul(BPS_SCALE)
                .ok_or_else(|| overflow("margin"))?
                / cost.cents(),
        )
    } else {
        None
    };

    let potential = margin
        .multiply_quantity(product.stock)
        .ok_or_else(|| overflow("potential profit"))?;

    Ok(ProductProfit {
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit_cost_cents: cost.cents(),
        sale_price_cents: product.sale_price_cents,
        unit_margin_cents: margin.cents(),
        margin_bps,
        stock: product.stock,
        potential_profit_cents: potential.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
