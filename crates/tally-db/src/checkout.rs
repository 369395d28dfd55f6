//! # Sale Commit Unit
//!
//! Turns a validated [`SaleRequest`] into one durable sale, or nothing.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pool.begin()                                                           │
//! │     │                                                                   │
//! │     ├── for each line: ledger::reserve(&mut tx, product, qty)          │
//! │     │       └── first UPDATE takes the write lock; price is read here  │
//! │     │                                                                   │
//! │     ├── customer exists?                                               │
//! │     ├── INSERT sales (id, customer_id, created_at)                      │
//! │     ├── INSERT sale_items × N (captured price, name, cost)             │
//! │     │                                                                   │
//! │     └── tx.commit()                                                    │
//! │                                                                         │
//! │  Any `?` before commit drops `tx`, which rolls back every decrement.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delete
//! One transaction: lock the sale row, `release` each item's quantity,
//! delete items, delete header. Stock taken out of circulation always equals
//! the units in sales that still exist.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::ledger;
use tally_core::{CoreError, SaleRequest};

/// Stock given back by a sale deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoredLine {
    pub product_id: String,
    pub quantity: i64,
    /// Stock after the release.
    pub stock: i64,
}

/// Commit and delete of whole sales.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Commits a sale: reserves every line and writes header + items
    /// atomically. Returns the new sale id.
    ///
    /// ## Errors
    /// * `CoreError::InsufficientStock` - a line no longer fits; nothing written
    /// * `CoreError::ProductNotFound` - a product is gone or deactivated
    /// * `CoreError::CustomerNotFound` - the customer was deleted
    /// * storage errors - nothing written
    pub async fn commit_sale(&self, request: &SaleRequest) -> DbResult<String> {
        let sale_id = Uuid::new_v4().to_string();

        debug!(
            sale_id = %sale_id,
            lines = request.lines().len(),
            "Committing sale"
        );

        match self.commit_unit(&sale_id, request).await {
            Ok(()) => {
                info!(
                    sale_id = %sale_id,
                    customer_id = %request.customer_id(),
                    units = request.total_quantity(),
                    "Sale committed"
                );
                Ok(sale_id)
            }
            Err(err) => {
                warn!(sale_id = %sale_id, error = %err, "Sale commit aborted");
                Err(err)
            }
        }
    }

    async fn commit_unit(&self, sale_id: &str, request: &SaleRequest) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut reservations = Vec::with_capacity(request.lines().len());
        for line in request.lines() {
            let reservation = ledger::reserve(&mut tx, &line.product_id, line.quantity).await?;
            if !reservation.is_active {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }
            reservations.push((line, reservation));
        }

        let customer_exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
                .bind(request.customer_id())
                .fetch_optional(&mut *tx)
                .await?;
        if customer_exists.is_none() {
            return Err(CoreError::CustomerNotFound(request.customer_id().to_string()).into());
        }

        sqlx::query("INSERT INTO sales (id, customer_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(sale_id)
            .bind(request.customer_id())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        for (line_no, (line, reservation)) in reservations.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, line_no, name_snapshot,
                    quantity, unit_price_cents, unit_cost_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(sale_id)
            .bind(&line.product_id)
            .bind(line_no as i64)
            .bind(&reservation.name)
            .bind(line.quantity)
            .bind(reservation.unit_price_cents)
            .bind(reservation.unit_cost_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a committed sale and gives its stock back, atomically.
    pub async fn delete_sale(&self, sale_id: &str) -> DbResult<Vec<RestoredLine>> {
        debug!(sale_id = %sale_id, "Deleting sale");

        let mut tx = self.pool.begin().await?;

        // A write first, so the transaction holds the write lock before it
        // reads the items it is about to release.
        let locked = sqlx::query("UPDATE sales SET id = id WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        let items: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_id, quantity FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut restored = Vec::with_capacity(items.len());
        for (product_id, quantity) in items {
            let stock = ledger::release(&mut tx, &product_id, quantity).await?;
            restored.push(RestoredLine {
                product_id,
                quantity,
                stock,
            });
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, lines = restored.len(), "Sale deleted, stock restored");
        Ok(restored)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
