//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  name           │   │  customer_id    │       │
//! │  │  price_cents    │   │  email, phone   │   │  created_at     │       │
//! │  │  stock (≥ 0)    │   └─────────────────┘   └────────┬────────┘       │
//! │  └─────────────────┘                                  │ 1..N           │
//! │                                              ┌────────▼────────┐       │
//! │                                              │    SaleItem     │       │
//! │                                              │  name_snapshot  │       │
//! │                                              │  quantity       │       │
//! │                                              │ unit_price_cents│       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Product::stock` is read-only from the point of view of every caller
//! except the inventory ledger in `tally-db`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, or any store code). Unique when present.
    pub barcode: Option<String>,

    /// Price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (for margin reporting).
    pub cost_cents: Option<i64>,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Key used to de-duplicate this product in a cart.
    ///
    /// The barcode when present, otherwise the product id.
    pub fn line_key(&self) -> &str {
        self.barcode.as_deref().unwrap_or(&self.id)
    }
}

/// Fields an operator may supply when creating or editing a product.
///
/// Stock is absent on purpose on edits: it only moves through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub barcode: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer a sale is recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields an operator may supply when creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale header. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a committed sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents read inside the commit unit (frozen).
    pub unit_price_cents: i64,
    /// Product cost at time of sale, when known (frozen).
    pub unit_cost_cents: Option<i64>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Gross margin for this line, when the cost was known at sale time.
    pub fn margin(&self) -> Option<Money> {
        self.unit_cost_cents
            .map(|cost| Money::from_cents(self.unit_price_cents - cost).multiply_quantity(self.quantity))
    }
}

// =============================================================================
// Sale Summary
// =============================================================================

/// One row of the sales history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleSummary {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    /// Number of distinct lines.
    pub item_count: i64,
    /// Σ(quantity × captured unit price).
    pub total_cents: i64,
}

impl SaleSummary {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
