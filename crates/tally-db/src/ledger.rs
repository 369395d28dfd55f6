//! # Inventory Ledger
//!
//! The only code allowed to change `products.stock`.
//!
//! ## Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  reserve(P, 3)                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock - 3                                 │
//! │   WHERE id = P AND stock >= 3            ← check and decrement are     │
//! │  RETURNING name, price_cents, ...          one statement               │
//! │       │                                                                 │
//! │       ├── 1 row  ──► Reservation { unit_price_cents, remaining, .. }   │
//! │       │                                                                 │
//! │       └── 0 rows ──► SELECT name, stock  ──► InsufficientStock         │
//! │                                          └─► ProductNotFound            │
//! │                                                                         │
//! │  Two terminals reserving the last unit: SQLite serializes the two      │
//! │  UPDATEs, the second sees stock 0 and matches no row.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation comes in two forms: a free function taking
//! `&mut SqliteConnection` (so the commit unit can run it inside its
//! transaction) and a method on [`InventoryLedger`] that runs it standalone.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use tally_core::{validation, CoreError};

// =============================================================================
// Results
// =============================================================================

/// A successful conditional decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Reservation {
    pub product_id: String,
    pub name: String,
    /// Price at the moment of reservation.
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    pub is_active: bool,
    /// Stock left after the decrement.
    pub remaining: i64,
}

/// Point-in-time price and stock of a product. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PriceAndStock {
    pub price_cents: i64,
    pub stock: i64,
}

fn check_quantity(product_id: &str, qty: i64) -> DbResult<()> {
    validation::validate_quantity(qty).map_err(|_| CoreError::InvalidQuantity {
        product_id: product_id.to_string(),
        quantity: qty,
    })?;
    Ok(())
}

// =============================================================================
// Connection-level Operations
// =============================================================================

/// Decrements stock by `qty` if and only if at least `qty` is on hand.
///
/// On failure nothing is written. Inside a transaction this is also the
/// statement that takes SQLite's write lock.
pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
) -> DbResult<Reservation> {
    check_quantity(product_id, qty)?;

    let reserved: Option<Reservation> = sqlx::query_as(
        r#"
        UPDATE products
        SET stock = stock - ?1,
            updated_at = ?3
        WHERE id = ?2 AND stock >= ?1
        RETURNING
            id AS product_id,
            name,
            price_cents AS unit_price_cents,
            cost_cents AS unit_cost_cents,
            is_active,
            stock AS remaining
        "#,
    )
    .bind(qty)
    .bind(product_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(reservation) = reserved {
        debug!(
            product_id = %product_id,
            qty,
            remaining = reservation.remaining,
            "Reserved stock"
        );
        return Ok(reservation);
    }

    // Nothing matched: tell "missing" from "not enough" for the operator.
    let current: Option<(String, i64)> =
        sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    let err = match current {
        Some((name, available)) => CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            name,
            available,
            requested: qty,
        },
        None => CoreError::ProductNotFound(product_id.to_string()),
    };

    debug!(product_id = %product_id, qty, error = %err, "Reservation refused");
    Err(err.into())
}

/// Increments stock by `qty` unconditionally. Returns the new stock.
pub async fn release(conn: &mut SqliteConnection, product_id: &str, qty: i64) -> DbResult<i64> {
    check_quantity(product_id, qty)?;

    let stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock + ?1,
            updated_at = ?3
        WHERE id = ?2
        RETURNING stock
        "#,
    )
    .bind(qty)
    .bind(product_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    let stock = stock.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
    debug!(product_id = %product_id, qty, stock, "Released stock");
    Ok(stock)
}

/// Reads price and stock. The value may be stale by the time it is used;
/// only [`reserve`] is authoritative.
pub async fn price_and_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<PriceAndStock> {
    let row: Option<PriceAndStock> =
        sqlx::query_as("SELECT price_cents, stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?)
}

// =============================================================================
// Pool-level Ledger
// =============================================================================

/// Standalone (autocommit) ledger operations, used for restock, write-off
/// and stock-ceiling refreshes.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Removes `qty` units from circulation (write-off, shrinkage).
    pub async fn reserve(&self, product_id: &str, qty: i64) -> DbResult<Reservation> {
        let mut conn = self.pool.acquire().await?;
        let reservation = reserve(&mut conn, product_id, qty).await?;
        info!(product_id = %product_id, qty, "Stock written off");
        Ok(reservation)
    }

    /// Adds `qty` units (restock). Returns the new stock.
    pub async fn release(&self, product_id: &str, qty: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let stock = release(&mut conn, product_id, qty).await?;
        info!(product_id = %product_id, qty, stock, "Stock received");
        Ok(stock)
    }

    /// Point read of price and stock.
    pub async fn price_and_stock(&self, product_id: &str) -> DbResult<PriceAndStock> {
        let mut conn = self.pool.acquire().await?;
        price_and_stock(&mut conn, product_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
