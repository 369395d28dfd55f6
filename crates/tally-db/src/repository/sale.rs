//! # Sale Repository
//!
//! Read access to committed sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT  (crate::checkout)                                          │
//! │     └── reserve every line, insert header + items, one transaction     │
//! │                                                                         │
//! │  2. READ    (this module)                                              │
//! │     └── get_by_id(), get_items(), list_summaries()                     │
//! │                                                                         │
//! │  3. DELETE  (crate::checkout)                                          │
//! │     └── release every item's quantity, drop rows, one transaction      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here writes: committed sales are immutable.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Sale, SaleItem, SaleSummary};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as("SELECT id, customer_id, created_at FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets the items of a sale in the order they were rung up.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, quantity,
                   unit_price_cents, unit_cost_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Most recent sales first, with customer name and totals.
    pub async fn list_summaries(&self, limit: u32) -> DbResult<Vec<SaleSummary>> {
        debug!(limit, "Listing sales");

        let summaries = sqlx::query_as(
            r#"
            SELECT
                s.id,
                s.customer_id,
                c.name AS customer_name,
                s.created_at,
                COUNT(i.id) AS item_count,
                COALESCE(SUM(i.quantity * i.unit_price_cents), 0) AS total_cents
            FROM sales s
            JOIN customers c ON c.id = s.customer_id
            LEFT JOIN sale_items i ON i.sale_id = s.id
            GROUP BY s.id, s.customer_id, c.name, s.created_at
            ORDER BY s.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    /// Units of a product across all committed sales.
    pub async fn quantity_sold(&self, product_id: &str) -> DbResult<i64> {
        let sold: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM sale_items WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sold)
    }

    /// Counts committed sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
