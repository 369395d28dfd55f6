//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Exact barcode lookup (the scan fast path)
//! - LIKE search over name and barcode (the fallback)
//! - Create, edit, soft delete
//!
//! Stock is set once at creation. Afterwards it only moves through
//! [`crate::ledger`]; `update` never touches it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{Product, ProductDraft};

const PRODUCT_COLUMNS: &str =
    "id, name, barcode, price_cents, cost_cents, stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name or barcode substring.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        self.search_filtered(query, limit, false).await
    }

    /// Like [`Self::search`], restricted to products with stock on hand.
    ///
    /// Used for checkout candidates: nothing out of stock can be picked.
    pub async fn search_in_stock(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        self.search_filtered(query, limit, true).await
    }

    async fn search_filtered(
        &self,
        query: &str,
        limit: u32,
        in_stock_only: bool,
    ) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit, in_stock_only, "Searching products");

        let pattern = like_pattern(query);
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (?1 = 0 OR stock > 0)
              AND (name LIKE ?2 ESCAPE '\' OR barcode LIKE ?2 ESCAPE '\')
            ORDER BY name
            LIMIT ?3
            "#
        );

        let products: Vec<Product> = sqlx::query_as(&sql)
            .bind(in_stock_only)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        self.search("", limit).await
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets an active product by exact barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        );
        let product = sqlx::query_as(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product with its opening stock.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - barcode already used by an active product
    pub async fn insert(&self, draft: &ProductDraft, initial_stock: i64) -> DbResult<Product> {
        debug!(name = %draft.name, barcode = ?draft.barcode, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: draft.name.trim().to_string(),
            barcode: normalize_barcode(draft.barcode.as_deref()),
            price_cents: draft.price_cents,
            cost_cents: draft.cost_cents,
            stock: initial_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, barcode, price_cents, cost_cents,
                stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), product.barcode.as_deref()))?;

        Ok(product)
    }

    /// Updates name, barcode, price and cost of an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let barcode = normalize_barcode(draft.barcode.as_deref());

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft.name.trim())
        .bind(&barcode)
        .bind(draft.price_cents)
        .bind(draft.cost_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), barcode.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Committed sales keep referencing the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0,
                updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

fn normalize_barcode(barcode: Option<&str>) -> Option<String> {
    barcode
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

fn with_barcode(err: DbError, barcode: Option<&str>) -> DbError {
    match (err, barcode) {
        (DbError::UniqueViolation { .. }, Some(barcode)) => DbError::duplicate("barcode", barcode),
        (err, _) => err,
    }
}

/// `%query%` with LIKE wildcards in the query escaped.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn draft(name: &str, barcode: Option<&str>, price: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            price_cents: price,
            cost_cents: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cola"), "%cola%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&draft("Water", Some(" 123 "), 999), 2).await.unwrap();
        assert_eq!(p.barcode.as_deref(), Some("123"));

        let by_barcode = repo.get_by_barcode("123").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, p.id);
        assert_eq!(by_barcode.stock, 2);
        assert_eq!(by_barcode.price_cents, 999);

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Water");
        assert!(repo.get_by_barcode("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&draft("Water", Some("123"), 999), 2).await.unwrap();
        let err = repo
            .insert(&draft("Other Water", Some("123"), 500), 1)
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "barcode");
                assert_eq!(value, "123");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_products_without_barcode_do_not_collide() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&draft("Bread", None, 250), 5).await.unwrap();
        repo.insert(&draft("Buns", Some("  "), 300), 5).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&draft("Cola Zero", Some("5449"), 150), 4).await.unwrap();
        repo.insert(&draft("Cola Classic", Some("5450"), 150), 0).await.unwrap();
        repo.insert(&draft("Bread", None, 250), 9).await.unwrap();

        let all = repo.search("cola", 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Cola Classic");

        let in_stock = repo.search_in_stock("cola", 50).await.unwrap();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].name, "Cola Zero");

        let by_barcode = repo.search("545", 50).await.unwrap();
        assert_eq!(by_barcode.len(), 2);

        assert_eq!(repo.list_active(2).await.unwrap().len(), 2);
        assert!(repo.search("100%", 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_never_touches_stock() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&draft("Water", Some("123"), 999), 2).await.unwrap();
        let updated = repo
            .update(&p.id, &draft("Still Water", Some("124"), 1099))
            .await
            .unwrap();

        assert_eq!(updated.name, "Still Water");
        assert_eq!(updated.barcode.as_deref(), Some("124"));
        assert_eq!(updated.price_cents, 1099);
        assert_eq!(updated.stock, 2);

        let err = repo.update("missing", &draft("X", None, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_frees_barcode() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&draft("Water", Some("123"), 999), 2).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        assert!(repo.get_by_barcode("123").await.unwrap().is_none());
        assert!(repo.search("water", 50).await.unwrap().is_empty());
        assert!(repo.get_by_id(&p.id).await.unwrap().is_some());

        repo.insert(&draft("New Water", Some("123"), 899), 1).await.unwrap();

        let err = repo.soft_delete(&p.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
