//! # Cart Commands
//!
//! Cart manipulation for the checkout screen.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Lifecycle                                  │
//! │                                                                         │
//! │  ┌───────────┐   scan   ┌───────────┐  :done   ┌────────────────┐      │
//! │  │   EMPTY   │ ───────► │ BUILDING  │ ───────► │  FINALIZING    │      │
//! │  │           │          │ :qty :rm  │          │  (commit unit) │      │
//! │  └───────────┘ ◄─────── └───────────┘ ◄─────── └────────────────┘      │
//! │        ▲        :clear        ▲         aborted        │ committed     │
//! │        └──────────────────────┴────────────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are addressed by their 1-based position in the cart listing.
//! Every function takes the session by `&mut`: only the foreground loop
//! calls them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use tally_core::{CartLine, CartNotice, CheckoutPhase, CheckoutSession};

/// One cart line for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub position: usize,
    pub key: String,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub stock_ceiling: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Cart contents and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLineDto>,
    pub total_cents: i64,
    pub total_quantity: i64,
    pub customer_id: Option<String>,
    pub phase: CheckoutPhase,
}

impl From<&CheckoutSession> for CartResponse {
    fn from(session: &CheckoutSession) -> Self {
        let cart = session.cart();
        CartResponse {
            lines: cart
                .lines()
                .iter()
                .enumerate()
                .map(|(i, line)| CartLineDto {
                    position: i + 1,
                    key: line.key().to_string(),
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    stock_ceiling: line.stock_ceiling,
                    unit_price_cents: line.unit_price_cents,
                    line_total_cents: line.line_total().cents(),
                })
                .collect(),
            total_cents: cart.total().cents(),
            total_quantity: cart.total_quantity(),
            customer_id: session.customer_id().map(str::to_string),
            phase: session.phase().clone(),
        }
    }
}

/// Result of a cart edit: the advisory outcome plus the new contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdate {
    pub notice: CartNotice,
    /// Name of the line the notice is about.
    pub name: String,
    pub cart: CartResponse,
}

pub fn get_cart(session: &CheckoutSession) -> CartResponse {
    CartResponse::from(session)
}

/// Applies a resolved scan: new line at quantity 1, or +1 on the existing
/// line with its ceiling refreshed from the scan's stock read.
pub fn add_scanned(session: &mut CheckoutSession, line: CartLine) -> Result<CartUpdate, ApiError> {
    debug!(key = %line.key(), "add_scanned command");
    let name = line.name.clone();
    let notice = session
        .add(line)
        .ok_or_else(|| ApiError::cart("A sale is being finalized"))?;

    Ok(CartUpdate {
        notice,
        name,
        cart: CartResponse::from(&*session),
    })
}

/// Sets the quantity of the line at `position`.
///
/// The stock ceiling is re-read from the ledger first, so the clamp uses
/// current stock rather than the stock seen at scan time.
pub async fn set_line_quantity(
    db: &DbState,
    session: &mut CheckoutSession,
    position: usize,
    quantity: i64,
) -> Result<CartUpdate, ApiError> {
    debug!(position, quantity, "set_line_quantity command");

    let line = line_at(session, position)?;
    let (key, name, product_id) = (line.key().to_string(), line.name.clone(), line.product_id.clone());

    let current = db.inner().ledger().price_and_stock(&product_id).await?;

    let notice = session
        .edit(|cart| {
            let refreshed = cart.refresh_ceiling(&key, current.stock);
            match (refreshed, cart.set_quantity(&key, quantity)) {
                // Fresh stock already lowered the line; that is the change.
                (
                    CartNotice::QuantityChanged { quantity },
                    CartNotice::Unchanged | CartNotice::MinimumQuantityReached,
                ) => CartNotice::QuantityChanged { quantity },
                (_, notice) => notice,
            }
        })
        .ok_or_else(|| ApiError::cart("A sale is being finalized"))?;

    Ok(CartUpdate {
        notice,
        name,
        cart: CartResponse::from(&*session),
    })
}

/// Removes the line at `position`.
pub fn remove_line(session: &mut CheckoutSession, position: usize) -> Result<CartResponse, ApiError> {
    debug!(position, "remove_line command");

    let key = line_at(session, position)?.key().to_string();
    if !session.remove(&key) {
        return Err(ApiError::cart("A sale is being finalized"));
    }
    Ok(CartResponse::from(&*session))
}

/// Abandons the cart. Nothing is persisted.
pub fn clear_cart(session: &mut CheckoutSession) -> CartResponse {
    debug!("clear_cart command");
    session.abandon();
    CartResponse::from(&*session)
}

fn line_at(session: &CheckoutSession, position: usize) -> Result<&CartLine, ApiError> {
    session
        .cart()
        .line_at(position)
        .ok_or_else(|| ApiError::cart(format!("No line {position} in cart")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::ProductDraft;
    use tally_db::{Database, DbConfig};

    async fn db_with_water(stock: i64) -> (DbState, CartLine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(
                &ProductDraft {
                    name: "Water".to_string(),
                    barcode: Some("123".to_string()),
                    price_cents: 999,
                    cost_cents: None,
                },
                stock,
            )
            .await
            .unwrap();
        (DbState::new(db), CartLine::from_product(&product))
    }

    #[tokio::test]
    async fn test_scan_three_times_stops_at_stock() {
        let (_db, line) = db_with_water(2).await;
        let mut session = CheckoutSession::new();

        let first = add_scanned(&mut session, line.clone()).unwrap();
        assert_eq!(first.notice, CartNotice::Added);
        let second = add_scanned(&mut session, line.clone()).unwrap();
        assert_eq!(second.notice, CartNotice::QuantityChanged { quantity: 2 });
        let third = add_scanned(&mut session, line).unwrap();
        assert_eq!(third.notice, CartNotice::StockCeilingReached);

        assert_eq!(third.cart.lines[0].quantity, 2);
        assert_eq!(third.cart.total_cents, 1998);
        assert_eq!(third.cart.phase, CheckoutPhase::Building);
    }

    #[tokio::test]
    async fn test_set_quantity_uses_fresh_stock() {
        let (db, line) = db_with_water(2).await;
        let mut session = CheckoutSession::new();
        add_scanned(&mut session, line.clone()).unwrap();

        db.inner().ledger().release(&line.product_id, 3).await.unwrap();

        let update = set_line_quantity(&db, &mut session, 1, 4).await.unwrap();
        assert_eq!(update.notice, CartNotice::QuantityChanged { quantity: 4 });
        assert_eq!(update.cart.lines[0].stock_ceiling, 5);
    }

    #[tokio::test]
    async fn test_set_quantity_reports_clamp_from_fallen_stock() {
        let (db, line) = db_with_water(5).await;
        let mut session = CheckoutSession::new();
        add_scanned(&mut session, line.clone()).unwrap();
        set_line_quantity(&db, &mut session, 1, 5).await.unwrap();

        db.inner().ledger().reserve(&line.product_id, 2).await.unwrap();

        let update = set_line_quantity(&db, &mut session, 1, 3).await.unwrap();
        assert_eq!(update.notice, CartNotice::QuantityChanged { quantity: 3 });
        assert_eq!(update.cart.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_set_quantity_floors_at_one() {
        let (db, line) = db_with_water(2).await;
        let mut session = CheckoutSession::new();
        add_scanned(&mut session, line).unwrap();

        let update = set_line_quantity(&db, &mut session, 1, 0).await.unwrap();
        assert_eq!(update.notice, CartNotice::MinimumQuantityReached);
        assert_eq!(update.cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_position_is_cart_error() {
        let (db, _line) = db_with_water(2).await;
        let mut session = CheckoutSession::new();

        let err = set_line_quantity(&db, &mut session, 3, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(remove_line(&mut session, 1).unwrap_err().code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (_db, line) = db_with_water(2).await;
        let mut session = CheckoutSession::new();
        add_scanned(&mut session, line.clone()).unwrap();

        let cart = remove_line(&mut session, 1).unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.phase, CheckoutPhase::Empty);

        add_scanned(&mut session, line).unwrap();
        let cart = clear_cart(&mut session);
        assert_eq!(cart.total_cents, 0);
        assert!(cart.lines.is_empty());
    }
}
