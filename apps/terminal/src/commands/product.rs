//! # Product Commands
//!
//! Catalog lookup and maintenance.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types "5901000000042"                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Is query a barcode? (8-13 digits)        │                         │
//! │  │  YES: Try exact barcode lookup first      │──► Found? Return [1]    │
//! │  │  NO:  LIKE search over name and barcode   │                         │
//! │  └───────────────────────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock only changes through restock / write-off, which go through the
//! inventory ledger like a sale does. Editing a product never touches it.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;
use tally_core::validation::{
    validate_initial_stock, validate_product_draft, validate_quantity, validate_search_query,
};
use tally_core::{Product, ProductDraft};

/// Product as shown in listings and forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub stock: i64,
    pub is_active: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            name: p.name,
            barcode: p.barcode,
            price_cents: p.price_cents,
            cost_cents: p.cost_cents,
            stock: p.stock,
            is_active: p.is_active,
        }
    }
}

/// Input for create and edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub barcode: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
}

impl ProductInput {
    /// Trimmed draft; a blank barcode means "no barcode".
    fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name.trim().to_string(),
            barcode: self
                .barcode
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            price_cents: self.price_cents,
            cost_cents: self.cost_cents,
        }
    }
}

/// New stock level after a restock or write-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub product_id: String,
    pub stock: i64,
}

/// Checks if a query looks like a barcode (8-13 numeric digits).
///
/// EAN-8, UPC-A and EAN-13 all fall in this range.
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

/// Searches active products by name or barcode.
///
/// Barcode-shaped queries try an exact lookup first. Out-of-stock products
/// are included; the checkout candidate list uses its own in-stock search.
pub async fn search_products(
    db: &DbState,
    query: &str,
    limit: u32,
) -> Result<Vec<ProductDto>, ApiError> {
    let start = Instant::now();
    let query = validate_search_query(query).map_err(|e| ApiError::validation(e.to_string()))?;

    debug!(query = %query, limit, "search_products command");

    if is_barcode_query(&query) {
        if let Some(product) = db.inner().products().get_by_barcode(&query).await? {
            debug!(barcode = %query, "search_products barcode hit");
            return Ok(vec![ProductDto::from(product)]);
        }
        debug!("Barcode not found, falling back to LIKE search");
    }

    let products = db.inner().products().search(&query, limit).await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    debug!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        "search_products complete"
    );

    Ok(dtos)
}

pub async fn list_products(db: &DbState, limit: u32) -> Result<Vec<ProductDto>, ApiError> {
    debug!(limit, "list_products command");
    let products = db.inner().products().list_active(limit).await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Gets a product by id, including deactivated ones.
pub async fn get_product(db: &DbState, id: &str) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "get_product command");
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .map(ProductDto::from)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Creates a product with its opening stock.
///
/// ## Errors
/// * `VALIDATION_ERROR` - bad name, barcode, price, cost or stock
/// * `CONFLICT` - barcode already used by an active product
pub async fn create_product(
    db: &DbState,
    input: ProductInput,
    initial_stock: i64,
) -> Result<ProductDto, ApiError> {
    let draft = input.into_draft();
    debug!(name = %draft.name, "create_product command");

    validate_product_draft(&draft).map_err(|e| ApiError::validation(e.to_string()))?;
    validate_initial_stock(initial_stock).map_err(|e| ApiError::validation(e.to_string()))?;

    let product = db.inner().products().insert(&draft, initial_stock).await?;
    info!(id = %product.id, name = %product.name, stock = product.stock, "Product created");
    Ok(ProductDto::from(product))
}

/// Edits name, barcode, price and cost. Stock is left alone, and sales
/// already committed keep the price they were sold at.
pub async fn update_product(
    db: &DbState,
    id: &str,
    input: ProductInput,
) -> Result<ProductDto, ApiError> {
    let draft = input.into_draft();
    debug!(id = %id, "update_product command");

    validate_product_draft(&draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let product = db.inner().products().update(id, &draft).await?;
    info!(id = %product.id, price_cents = product.price_cents, "Product updated");
    Ok(ProductDto::from(product))
}

/// Soft delete. The product disappears from lookups; committed sales keep
/// pointing at it.
pub async fn deactivate_product(db: &DbState, id: &str) -> Result<(), ApiError> {
    debug!(id = %id, "deactivate_product command");
    db.inner().products().soft_delete(id).await?;
    info!(id = %id, "Product deactivated");
    Ok(())
}

/// Adds received goods to stock.
pub async fn restock_product(db: &DbState, id: &str, quantity: i64) -> Result<StockChange, ApiError> {
    debug!(id = %id, quantity, "restock_product command");
    validate_quantity(quantity).map_err(|e| ApiError::validation(e.to_string()))?;

    let stock = db.inner().ledger().release(id, quantity).await?;
    Ok(StockChange {
        product_id: id.to_string(),
        stock,
    })
}

/// Removes damaged or lost goods from stock. Refused when fewer than
/// `quantity` units are on hand.
pub async fn write_off_product(
    db: &DbState,
    id: &str,
    quantity: i64,
) -> Result<StockChange, ApiError> {
    debug!(id = %id, quantity, "write_off_product command");
    validate_quantity(quantity).map_err(|e| ApiError::validation(e.to_string()))?;

    let reservation = db.inner().ledger().reserve(id, quantity).await?;
    Ok(StockChange {
        product_id: id.to_string(),
        stock: reservation.remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_db::{Database, DbConfig};

    async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn water() -> ProductInput {
        ProductInput {
            name: "  Water 500ml ".to_string(),
            barcode: Some("5449000000996".to_string()),
            price_cents: 999,
            cost_cents: Some(400),
        }
    }

    #[test]
    fn test_is_barcode_query() {
        assert!(is_barcode_query("12345678"));
        assert!(is_barcode_query("5449000000996"));
        assert!(!is_barcode_query("1234567"));
        assert!(!is_barcode_query("coke"));
        assert!(!is_barcode_query("54490000009961"));
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let db = db().await;
        let created = create_product(&db, water(), 5).await.unwrap();
        assert_eq!(created.name, "Water 500ml");
        assert_eq!(created.stock, 5);

        let by_barcode = search_products(&db, "5449000000996", 20).await.unwrap();
        assert_eq!(by_barcode.len(), 1);
        assert_eq!(by_barcode[0].id, created.id);

        let by_name = search_products(&db, "wat", 20).await.unwrap();
        assert_eq!(by_name.len(), 1);

        assert!(search_products(&db, "bread", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_barcode_is_none() {
        let db = db().await;
        let input = ProductInput {
            barcode: Some("   ".to_string()),
            ..water()
        };
        let created = create_product(&db, input, 0).await.unwrap();
        assert_eq!(created.barcode, None);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = db().await;

        let negative = ProductInput {
            price_cents: -1,
            ..water()
        };
        let err = create_product(&db, negative, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_product(&db, water(), -3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let unnamed = ProductInput {
            name: " ".to_string(),
            ..water()
        };
        let err = create_product(&db, unnamed, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_is_conflict() {
        let db = db().await;
        create_product(&db, water(), 1).await.unwrap();

        let err = create_product(&db, water(), 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let db = db().await;
        let created = create_product(&db, water(), 7).await.unwrap();

        let updated = update_product(
            &db,
            &created.id,
            ProductInput {
                price_cents: 1299,
                ..water()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price_cents, 1299);
        assert_eq!(updated.stock, 7);
    }

    #[tokio::test]
    async fn test_restock_and_write_off() {
        let db = db().await;
        let created = create_product(&db, water(), 2).await.unwrap();

        let change = restock_product(&db, &created.id, 10).await.unwrap();
        assert_eq!(change.stock, 12);

        let change = write_off_product(&db, &created.id, 5).await.unwrap();
        assert_eq!(change.stock, 7);

        let err = write_off_product(&db, &created.id, 8).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(get_product(&db, &created.id).await.unwrap().stock, 7);

        let err = restock_product(&db, &created.id, 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_pallet_sized_stock() {
        let db = db().await;
        let created = create_product(&db, water(), 1200).await.unwrap();
        assert_eq!(created.stock, 1200);

        let change = restock_product(&db, &created.id, 1000).await.unwrap();
        assert_eq!(change.stock, 2200);
    }

    #[tokio::test]
    async fn test_deactivated_product_leaves_listing() {
        let db = db().await;
        let created = create_product(&db, water(), 2).await.unwrap();

        deactivate_product(&db, &created.id).await.unwrap();

        assert!(list_products(&db, 50).await.unwrap().is_empty());
        assert!(search_products(&db, "5449000000996", 20).await.unwrap().is_empty());
        assert!(!get_product(&db, &created.id).await.unwrap().is_active);

        let err = deactivate_product(&db, &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
