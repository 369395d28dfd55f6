//! # Checkout
//!
//! The pure half of the sale commit protocol: precondition checks that turn
//! a cart into a [`SaleRequest`], and the phase machine a checkout session
//! moves through.
//!
//! ## Phase Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Empty ──add──► Building ──begin_finalize──► Finalizing               │
//! │     ▲               ▲  │                          │        │            │
//! │     │   remove last │  │ (precondition fails:     │        │            │
//! │     └───────────────┘  │  stays Building)         │        │            │
//! │                        │                 commit ok│        │commit err  │
//! │                        │                          ▼        ▼            │
//! │     Empty ◄──cart cleared── Committed        Aborted ──► Building       │
//! │                                              (cart kept for retry)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage (reservation, header and item inserts) happens in
//! `tally-db::checkout`; this module never touches it.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine, CartNotice};
use crate::error::{CoreError, CoreResult};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Sale Request
// =============================================================================

/// One line of a sale about to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated request to commit a sale.
///
/// Only constructible through [`SaleRequest::new`] or
/// [`Cart::to_sale_request`], so every instance has passed the
/// preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRequest {
    customer_id: String,
    lines: Vec<SaleLine>,
}

impl SaleRequest {
    /// Checks the commit preconditions, in order:
    /// 1. at least one line (`EmptyCart`)
    /// 2. a non-blank customer (`MissingCustomer`)
    /// 3. every quantity in `1..=MAX_ITEM_QUANTITY` (`InvalidQuantity`)
    pub fn new(customer_id: Option<&str>, lines: Vec<SaleLine>) -> CoreResult<Self> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let customer_id = match customer_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(CoreError::MissingCustomer),
        };

        if let Some(bad) = lines
            .iter()
            .find(|l| l.quantity <= 0 || l.quantity > MAX_ITEM_QUANTITY)
        {
            return Err(CoreError::InvalidQuantity {
                product_id: bad.product_id.clone(),
                quantity: bad.quantity,
            });
        }

        Ok(SaleRequest { customer_id, lines })
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

impl Cart {
    /// Builds a commit request from the current lines.
    pub fn to_sale_request(&self, customer_id: Option<&str>) -> CoreResult<SaleRequest> {
        let lines = self
            .lines()
            .iter()
            .map(|l| SaleLine {
                product_id: l.product_id.clone(),
                quantity: l.quantity,
            })
            .collect();
        SaleRequest::new(customer_id, lines)
    }
}

// =============================================================================
// Checkout Phase
// =============================================================================

/// Where a checkout session currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// No lines.
    #[default]
    Empty,
    /// Lines present, still editable.
    Building,
    /// A commit is in flight; the cart must not change.
    Finalizing,
    /// The last commit succeeded and the cart was cleared.
    Committed { sale_id: String },
    /// The last commit failed; the cart is intact.
    Aborted { reason: String },
}

// =============================================================================
// Checkout Session
// =============================================================================

/// One operator's checkout: cart, chosen customer and phase.
///
/// Owned by a single foreground task. Cart mutations are refused while a
/// commit is in flight.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    cart: Cart,
    customer_id: Option<String>,
    phase: CheckoutPhase,
}

impl CheckoutSession {
    pub fn new() -> Self {
        CheckoutSession::default()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id;
    }

    /// Applies a cart mutation and re-derives the phase.
    ///
    /// Returns `None` while finalizing; the mutation is not applied.
    pub fn edit<F>(&mut self, f: F) -> Option<CartNotice>
    where
        F: FnOnce(&mut Cart) -> CartNotice,
    {
        if self.phase == CheckoutPhase::Finalizing {
            return None;
        }
        let notice = f(&mut self.cart);
        self.settle();
        Some(notice)
    }

    /// Shorthand for [`Cart::add_or_increment`] through [`Self::edit`].
    pub fn add(&mut self, line: CartLine) -> Option<CartNotice> {
        self.edit(|cart| cart.add_or_increment(line))
    }

    /// Removes a line. `false` when absent or while finalizing.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.phase == CheckoutPhase::Finalizing {
            return false;
        }
        let removed = self.cart.remove_line(key);
        self.settle();
        removed
    }

    /// Abandons the cart without persisting anything.
    pub fn abandon(&mut self) {
        if self.phase == CheckoutPhase::Finalizing {
            return;
        }
        self.cart.clear();
        self.phase = CheckoutPhase::Empty;
    }

    /// Checks preconditions and enters `Finalizing`.
    ///
    /// On a precondition failure the phase is left unchanged and no
    /// storage access should follow.
    pub fn begin_finalize(&mut self) -> CoreResult<SaleRequest> {
        let request = self.cart.to_sale_request(self.customer_id.as_deref())?;
        self.phase = CheckoutPhase::Finalizing;
        Ok(request)
    }

    /// Records a successful commit: clears the cart.
    pub fn commit_succeeded(&mut self, sale_id: String) {
        self.cart.clear();
        self.phase = CheckoutPhase::Committed { sale_id };
    }

    /// Records a failed commit: the cart stays for the operator to fix.
    pub fn commit_failed(&mut self, reason: impl Into<String>) {
        self.phase = CheckoutPhase::Aborted {
            reason: reason.into(),
        };
    }

    fn settle(&mut self) {
        self.phase = if self.cart.is_empty() {
            match &self.phase {
                CheckoutPhase::Committed { .. } => self.phase.clone(),
                _ => CheckoutPhase::Empty,
            }
        } else {
            CheckoutPhase::Building
        };
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, barcode: &str, stock: i64) -> CartLine {
        CartLine::new(id, id.to_uppercase(), Some(barcode.to_string()), 999, stock)
    }

    #[test]
    fn test_empty_cart_checked_first() {
        let cart = Cart::new();
        assert_eq!(cart.to_sale_request(None), Err(CoreError::EmptyCart));
        assert_eq!(cart.to_sale_request(Some("c-1")), Err(CoreError::EmptyCart));
    }

    #[test]
    fn test_missing_customer() {
        let mut cart = Cart::new();
        cart.add_or_increment(line("p-1", "123", 2));

        assert_eq!(cart.to_sale_request(None), Err(CoreError::MissingCustomer));
        assert_eq!(
            cart.to_sale_request(Some("   ")),
            Err(CoreError::MissingCustomer)
        );
    }

    #[test]
    fn test_invalid_quantity() {
        let lines = vec![
            SaleLine {
                product_id: "p-1".to_string(),
                quantity: 1,
            },
            SaleLine {
                product_id: "p-2".to_string(),
                quantity: 0,
            },
        ];
        assert_eq!(
            SaleRequest::new(Some("c-1"), lines),
            Err(CoreError::InvalidQuantity {
                product_id: "p-2".to_string(),
                quantity: 0,
            })
        );
    }

    #[test]
    fn test_request_from_cart() {
        let mut cart = Cart::new();
        cart.add_or_increment(line("p-1", "123", 2));
        cart.add_or_increment(line("p-1", "123", 2));
        cart.add_or_increment(line("p-2", "456", 9));

        let request = cart.to_sale_request(Some(" c-1 ")).unwrap();
        assert_eq!(request.customer_id(), "c-1");
        assert_eq!(request.lines().len(), 2);
        assert_eq!(request.lines()[0].quantity, 2);
        assert_eq!(request.total_quantity(), 3);
    }

    #[test]
    fn test_session_phases() {
        let mut session = CheckoutSession::new();
        assert_eq!(session.phase(), &CheckoutPhase::Empty);

        session.add(line("p-1", "123", 2));
        assert_eq!(session.phase(), &CheckoutPhase::Building);

        // Precondition failure leaves the session editable.
        assert_eq!(session.begin_finalize(), Err(CoreError::MissingCustomer));
        assert_eq!(session.phase(), &CheckoutPhase::Building);

        session.set_customer(Some("c-1".to_string()));
        let request = session.begin_finalize().unwrap();
        assert_eq!(request.lines().len(), 1);
        assert_eq!(session.phase(), &CheckoutPhase::Finalizing);

        // Frozen while finalizing.
        assert_eq!(session.add(line("p-2", "456", 2)), None);
        assert!(!session.remove("123"));
        assert_eq!(session.cart().len(), 1);

        session.commit_succeeded("s-1".to_string());
        assert!(session.cart().is_empty());
        assert_eq!(
            session.phase(),
            &CheckoutPhase::Committed {
                sale_id: "s-1".to_string()
            }
        );

        session.add(line("p-2", "456", 2));
        assert_eq!(session.phase(), &CheckoutPhase::Building);
    }

    #[test]
    fn test_session_abort_keeps_cart() {
        let mut session = CheckoutSession::new();
        session.set_customer(Some("c-1".to_string()));
        session.add(line("p-1", "123", 2));
        session.begin_finalize().unwrap();

        session.commit_failed("Insufficient stock for P-1");
        assert_eq!(session.cart().len(), 1);
        assert!(matches!(session.phase(), CheckoutPhase::Aborted { .. }));

        session.edit(|cart| cart.set_quantity("123", 1));
        assert_eq!(session.phase(), &CheckoutPhase::Building);

        assert!(session.remove("123"));
        assert_eq!(session.phase(), &CheckoutPhase::Empty);
    }

    #[test]
    fn test_abandon_clears() {
        let mut session = CheckoutSession::new();
        session.add(line("p-1", "123", 2));
        session.abandon();
        assert!(session.cart().is_empty());
        assert_eq!(session.phase(), &CheckoutPhase::Empty);
    }
}
