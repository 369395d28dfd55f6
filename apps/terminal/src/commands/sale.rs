//! # Sale Commands
//!
//! Finalize, receipts, history and deletion.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  :done                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  session.begin_finalize()  ── EmptyCart / MissingCustomer ──► ApiError │
//! │    │  (phase: Finalizing, no storage touched yet)                       │
//! │    ▼                                                                    │
//! │  db.checkout().commit_sale(request)                                     │
//! │    │                                                                    │
//! │    ├── Ok(sale_id) ──► commit_succeeded: cart cleared ──► receipt       │
//! │    └── Err(e)      ──► commit_failed: cart kept ───────► ApiError       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use tally_core::{CheckoutSession, SaleSummary};
use tally_db::RestoredLine;

/// Printable receipt for a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub sale_id: String,
    pub store_name: String,
    pub customer_name: String,
    pub timestamp: String,
    pub items: Vec<ReceiptItem>,
    pub total_cents: i64,
    /// Σ line margins, when every line had a known cost.
    pub margin_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub margin_cents: Option<i64>,
}

/// One row of the sales history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummaryDto {
    pub id: String,
    pub customer_name: String,
    pub created_at: String,
    pub item_count: i64,
    pub total_cents: i64,
}

impl From<SaleSummary> for SaleSummaryDto {
    fn from(s: SaleSummary) -> Self {
        SaleSummaryDto {
            id: s.id,
            customer_name: s.customer_name,
            created_at: s.created_at.to_rfc3339(),
            item_count: s.item_count,
            total_cents: s.total_cents,
        }
    }
}

/// Commits the session's cart as one sale and returns its receipt.
///
/// ## Errors
/// * `CART_ERROR` / `VALIDATION_ERROR` - preconditions; nothing stored
/// * `INSUFFICIENT_STOCK` - a line no longer fits; nothing stored, cart kept
/// * `NOT_FOUND` - customer or product disappeared; nothing stored
pub async fn finalize_sale(
    db: &DbState,
    config: &ConfigState,
    session: &mut CheckoutSession,
) -> Result<ReceiptResponse, ApiError> {
    debug!("finalize_sale command");

    let request = session.begin_finalize()?;

    match db.inner().checkout().commit_sale(&request).await {
        Ok(sale_id) => {
            session.commit_succeeded(sale_id.clone());
            info!(sale_id = %sale_id, "Sale finalized");
            get_receipt(db, config, &sale_id).await
        }
        Err(e) => {
            let err = ApiError::from(e);
            warn!(error = %err, "Sale aborted, cart kept");
            session.commit_failed(err.message.clone());
            Err(err)
        }
    }
}

/// Builds the receipt of a committed sale from its captured prices.
pub async fn get_receipt(
    db: &DbState,
    config: &ConfigState,
    sale_id: &str,
) -> Result<ReceiptResponse, ApiError> {
    debug!(sale_id = %sale_id, "get_receipt command");

    let sale = db
        .inner()
        .sales()
        .get_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))?;
    let customer_name = db
        .inner()
        .customers()
        .get_by_id(&sale.customer_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_else(|| sale.customer_id.clone());
    let items = db.inner().sales().get_items(sale_id).await?;

    let total_cents = items.iter().map(|i| i.line_total().cents()).sum();
    let margin_cents = items
        .iter()
        .map(|i| i.margin().map(|m| m.cents()))
        .sum::<Option<i64>>();

    Ok(ReceiptResponse {
        sale_id: sale.id,
        store_name: config.store_name.clone(),
        customer_name,
        timestamp: sale.created_at.to_rfc3339(),
        items: items
            .into_iter()
            .map(|i| ReceiptItem {
                margin_cents: i.margin().map(|m| m.cents()),
                line_total_cents: i.line_total().cents(),
                name: i.name_snapshot,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
            })
            .collect(),
        total_cents,
        margin_cents,
    })
}

/// Most recent sales first.
pub async fn list_sales(db: &DbState, limit: u32) -> Result<Vec<SaleSummaryDto>, ApiError> {
    debug!(limit, "list_sales command");
    let sales = db.inner().sales().list_summaries(limit).await?;
    Ok(sales.into_iter().map(SaleSummaryDto::from).collect())
}

/// Deletes a committed sale and returns the stock it gave back.
pub async fn delete_sale(db: &DbState, sale_id: &str) -> Result<Vec<RestoredLine>, ApiError> {
    debug!(sale_id = %sale_id, "delete_sale command");
    Ok(db.inner().checkout().delete_sale(sale_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::{CartLine, CheckoutPhase, CustomerDraft, ProductDraft};
    use tally_db::{Database, DbConfig};

    struct Fixture {
        db: DbState,
        config: ConfigState,
        customer_id: String,
        water: CartLine,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .insert(&CustomerDraft {
                name: "Ana".to_string(),
                email: None,
                phone: None,
            })
            .await
            .unwrap();
        let water = db
            .products()
            .insert(
                &ProductDraft {
                    name: "Water".to_string(),
                    barcode: Some("123".to_string()),
                    price_cents: 999,
                    cost_cents: Some(400),
                },
                2,
            )
            .await
            .unwrap();

        Fixture {
            db: DbState::new(db),
            config: ConfigState::default(),
            customer_id: customer.id,
            water: CartLine::from_product(&water),
        }
    }

    #[tokio::test]
    async fn test_finalize_commits_and_clears_cart() {
        let f = fixture().await;
        let mut session = CheckoutSession::new();
        session.add(f.water.clone());
        session.add(f.water.clone());
        session.set_customer(Some(f.customer_id.clone()));

        let receipt = finalize_sale(&f.db, &f.config, &mut session).await.unwrap();

        assert_eq!(receipt.customer_name, "Ana");
        assert_eq!(receipt.total_cents, 1998);
        assert_eq!(receipt.margin_cents, Some(1198));
        assert_eq!(receipt.items[0].quantity, 2);
        assert!(session.cart().is_empty());
        assert_eq!(
            session.phase(),
            &CheckoutPhase::Committed {
                sale_id: receipt.sale_id.clone()
            }
        );

        let stock = f
            .db
            .inner()
            .ledger()
            .price_and_stock(&f.water.product_id)
            .await
            .unwrap()
            .stock;
        assert_eq!(stock, 0);
    }

    #[tokio::test]
    async fn test_missing_customer_touches_nothing() {
        let f = fixture().await;
        let mut session = CheckoutSession::new();
        session.add(f.water.clone());

        let err = finalize_sale(&f.db, &f.config, &mut session).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(session.phase(), &CheckoutPhase::Building);
        assert_eq!(session.cart().len(), 1);
        assert_eq!(f.db.inner().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let f = fixture().await;
        let mut session = CheckoutSession::new();
        session.set_customer(Some(f.customer_id.clone()));

        let err = finalize_sale(&f.db, &f.config, &mut session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(f.db.inner().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stock_lost_before_commit_keeps_cart() {
        let f = fixture().await;
        let mut session = CheckoutSession::new();
        session.add(f.water.clone());
        session.add(f.water.clone());
        session.set_customer(Some(f.customer_id.clone()));

        // Another terminal sells one unit in between.
        f.db.inner()
            .ledger()
            .reserve(&f.water.product_id, 1)
            .await
            .unwrap();

        let err = finalize_sale(&f.db, &f.config, &mut session).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(matches!(session.phase(), CheckoutPhase::Aborted { .. }));
        assert_eq!(session.cart().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_history_and_delete() {
        let f = fixture().await;
        let mut session = CheckoutSession::new();
        session.add(f.water.clone());
        session.set_customer(Some(f.customer_id.clone()));
        let receipt = finalize_sale(&f.db, &f.config, &mut session).await.unwrap();

        let history = list_sales(&f.db, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, receipt.sale_id);
        assert_eq!(history[0].total_cents, 999);

        let restored = delete_sale(&f.db, &receipt.sale_id).await.unwrap();
        assert_eq!(restored[0].stock, 2);
        assert!(list_sales(&f.db, 10).await.unwrap().is_empty());

        let err = delete_sale(&f.db, &receipt.sale_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
