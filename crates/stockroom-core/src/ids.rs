//! # Typed Identifiers
//!
//! One newtype per entity so a `ProductId` can never be passed where a
//! `CategoryId` is expected.
//!
//! ## Identity Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Raw input (path segment / JSON field)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductId::parse("productId", raw) ← format check, no lookup          │
//! │       │                                                                 │
//! │       ├── malformed? → ValidationError::InvalidFormat (400)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductId("3f2b…")  (canonical lowercase hyphenated UUID v4 text)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repository lookup → None? → NotFound (404)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are stored as TEXT, so the wrapped value is the canonical
//! string form rather than a `Uuid`.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::validation::{validate_uuid, ValidationResult};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        #[ts(export)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn generate() -> Self {
                $name(Uuid::new_v4().to_string())
            }

            /// Parses untrusted input, reporting failures against `field`.
            pub fn parse(field: &str, raw: &str) -> ValidationResult<Self> {
                let uuid = validate_uuid(field, raw)?;
                Ok($name(uuid.to_string()))
            }

            /// Returns the canonical string form.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`crate::Category`].
    CategoryId
);
entity_id!(
    /// Identifier of a [`crate::Product`].
    ProductId
);
entity_id!(
    /// Identifier of a [`crate::Client`].
    ClientId
);
entity_id!(
    /// Identifier of a [`crate::Catalog`].
    CatalogId
);
entity_id!(
    /// Identifier of a [`crate::Supplier`].
    SupplierId
);
entity_id!(
    /// Identifier of a [`crate::Sale`].
    SaleId
);
entity_id!(
    /// Identifier of a [`crate::SaleItem`].
    SaleItemId
);
entity_id!(
    /// Identifier of a [`crate::Notification`].
    NotificationId
);
