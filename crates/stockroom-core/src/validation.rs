//! # Validation Module
//!
//! Input validation for everything that arrives over HTTP.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum)                                        │
//! │  ├── JSON / query string shape (deserialization)                       │
//! │  └── Rejections mapped to 400                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Handler (Rust)                                               │
//! │  ├── THIS MODULE: ids, enums, ranges, required fields                  │
//! │  └── Runs before any lookup or write                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repository + SQLite                                          │
//! │  ├── Existence checks for referenced ids                               │
//! │  └── CHECK (stock >= 0), CHECK (credit_cents >= 0)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_name, validate_quantity};
//!
//! let name = validate_name("name", "  Beverages ").unwrap();
//! assert_eq!(name, "Beverages");
//!
//! validate_quantity(5).unwrap();
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::{NotificationKind, Percentage, RecordStatus};
use crate::{
    MAX_CREDIT_CENTS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_PRICE_INCREASE_PERCENT,
    MAX_SALE_ITEMS, MAX_STOCK, MAX_TOP_CLIENTS_LIMIT,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of short text fields (names, units, phone numbers, ...).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of free-text fields (notes, messages, addresses).
pub const MAX_TEXT_LEN: usize = 1_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required short text field and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_name;
///
/// assert!(validate_name("name", "Rice 1kg").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// assert!(validate_name("name", &"A".repeat(300)).is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    validate_required_text(field, value, MAX_NAME_LEN)
}

/// Validates a required text field of at most `max` characters.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional text field. Empty means "no value".
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Validates a text field that may be empty (phone, address, references).
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an e-mail address.
///
/// ## Rules
/// - Required
/// - Must contain `@` with something on both sides
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_name("email", email)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be an e-mail address".to_string(),
        }),
    }
}

// =============================================================================
// Enum Validators
// =============================================================================

/// Parses a record status (`active` | `inactive`).
pub fn validate_status(raw: &str) -> ValidationResult<RecordStatus> {
    raw.parse()
}

/// Parses a notification type (`info` | `warning` | `low_stock` | `sale`).
pub fn validate_notification_kind(raw: &str) -> ValidationResult<NotificationKind> {
    raw.parse()
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a numeric field is zero or greater.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("stock", 0).is_ok());
/// assert!(validate_non_negative("stock", -1).is_err());
/// ```
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<i64> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(value)
}

fn validate_bounded(field: &str, value: i64, max: i64) -> ValidationResult<i64> {
    validate_non_negative(field, value)?;

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: max.to_string(),
        });
    }

    Ok(value)
}

fn validate_delta(field: &str, delta: i64, max: i64) -> ValidationResult<i64> {
    if !(-max..=max).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: (-max).to_string(),
            max: max.to_string(),
        });
    }

    Ok(delta)
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// The ceiling [`MAX_PRICE_CENTS`] keeps sale totals inside i64.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<i64> {
    validate_bounded(field, cents, MAX_PRICE_CENTS)
}

/// Validates an absolute stock level (0 to [`MAX_STOCK`]).
pub fn validate_stock(stock: i64) -> ValidationResult<i64> {
    validate_bounded("stock", stock, MAX_STOCK)
}

/// Validates a stock adjustment; its magnitude is at most [`MAX_STOCK`].
pub fn validate_stock_delta(delta: i64) -> ValidationResult<i64> {
    validate_delta("delta", delta, MAX_STOCK)
}

/// Validates an absolute client credit (0 to [`MAX_CREDIT_CENTS`]).
pub fn validate_credit_cents(cents: i64) -> ValidationResult<i64> {
    validate_bounded("creditCents", cents, MAX_CREDIT_CENTS)
}

/// Validates a credit adjustment; its magnitude is at most [`MAX_CREDIT_CENTS`].
pub fn validate_credit_delta(delta_cents: i64) -> ValidationResult<i64> {
    validate_delta("deltaCents", delta_cents, MAX_CREDIT_CENTS)
}

/// Validates how many sale units a purchase unit contains (must be ≥ 1).
pub fn validate_quantity_included(qty: i64) -> ValidationResult<i64> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantityIncluded".to_string(),
        });
    }

    Ok(qty)
}

/// Validates the quantity of a sale line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /api/sales  items: [{ productId, quantity: 5 }]                   │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → 400 "quantity must be positive"                  │
/// │       │                                                                 │
/// │       ├── qty > 100000? → 400 "quantity must be between 1 and 100000" │
/// │       │                                                                 │
/// │       └── OK → stock check inside the sale transaction                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<i64> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_ITEM_QUANTITY.to_string(),
        });
    }

    Ok(qty)
}

/// Validates a bulk price increase percentage.
///
/// ## Rules
/// - Must be finite and strictly positive
/// - Must not round to 0 basis points
/// - At most [`MAX_PRICE_INCREASE_PERCENT`]
pub fn validate_price_increase(pct: f64) -> ValidationResult<Percentage> {
    if !pct.is_finite() || pct <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "percentage".to_string(),
        });
    }

    if pct > MAX_PRICE_INCREASE_PERCENT {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: "0".to_string(),
            max: MAX_PRICE_INCREASE_PERCENT.to_string(),
        });
    }

    let increase = Percentage::from_percent(pct);
    if increase.bps() == 0 {
        return Err(ValidationError::MustBePositive {
            field: "percentage".to_string(),
        });
    }

    Ok(increase)
}

/// Validates a sale discount percentage (0 to 100 inclusive).
pub fn validate_discount(pct: f64) -> ValidationResult<Percentage> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }

    Ok(Percentage::from_percent(pct))
}

/// Validates a low-stock threshold.
pub fn validate_threshold(threshold: i64) -> ValidationResult<i64> {
    validate_non_negative("threshold", threshold)
}

/// Validates the top-clients limit (1 to [`MAX_TOP_CLIENTS_LIMIT`]).
pub fn validate_top_limit(limit: i64) -> ValidationResult<i64> {
    if !(1..=MAX_TOP_CLIENTS_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: "1".to_string(),
            max: MAX_TOP_CLIENTS_LIMIT.to_string(),
        });
    }

    Ok(limit)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale.
///
/// ## Rules
/// - At least one item
/// - At most [`MAX_SALE_ITEMS`]
pub fn validate_sale_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: "1".to_string(),
            max: MAX_SALE_ITEMS.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string and returns the parsed value.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, raw: &str) -> ValidationResult<Uuid> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })
}

// =============================================================================
// Date Validators
// =============================================================================

/// Which end of a range a bare calendar date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// `YYYY-MM-DD` means 00:00:00 of that day.
    Start,
    /// `YYYY-MM-DD` means the last instant of that day (inclusive `to`).
    End,
}

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::{validate_date, DateBound};
///
/// let from = validate_date("from", "2024-03-01", DateBound::Start).unwrap();
/// let to = validate_date("to", "2024-03-01", DateBound::End).unwrap();
/// assert!(from < to);
/// assert!(validate_date("from", "yesterday", DateBound::Start).is_err());
/// ```
pub fn validate_date(field: &str, raw: &str, bound: DateBound) -> ValidationResult<DateTime<Utc>> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an RFC 3339 timestamp or YYYY-MM-DD".to_string(),
        }
    })?;

    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap_or(NaiveTime::MIN),
    };

    Ok(date.and_time(time).and_utc())
}

/// Validates that `from` is not after `to`.
pub fn validate_date_range(from: DateTime<Utc>, to: DateTime<Utc>) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "from".to_string(),
            reason: "must not be after `to`".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
