//! # Cart (Sale Builder)
//!
//! The in-memory staging area for one checkout session.
//!
//! ## Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Cart                                       │
//! │                                                                         │
//! │   index: HashMap<key, position>        lines: Vec<CartLine>            │
//! │   ┌──────────────┬─────┐               ┌───┬─────────────────────────┐ │
//! │   │ "123"        │  0  │ ────────────► │ 0 │ Water   ×2  ceiling 2   │ │
//! │   │ "p-7f3c…"    │  1  │ ────────────► │ 1 │ Bread   ×1  ceiling 10  │ │
//! │   └──────────────┴─────┘               └───┴─────────────────────────┘ │
//! │                                                                         │
//! │   key = barcode, or product id for products without one                │
//! │   total() is recomputed from lines on every call                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity Rules
//! ```text
//! set_quantity(key, desired)
//!      │
//!      ├── key absent ──────────────────────────► NotInCart
//!      ├── ceiling == 0 ────────────────────────► OutOfStock
//!      ├── desired < 1 and qty == 1 ────────────► MinimumQuantityReached
//!      ├── desired > ceiling and qty == ceiling ► StockCeilingReached
//!      ├── clamp desired into [1, ceiling]
//!      ├── clamped == qty ──────────────────────► Unchanged
//!      └── otherwise ───────────────────────────► QuantityChanged
//! ```
//!
//! Every outcome above is a [`CartNotice`], never an error. Lines are
//! removed only through [`Cart::remove_line`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart, with the data frozen at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID)
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Barcode at time of adding (frozen)
    pub barcode: Option<String>,

    /// Price in cents at time of adding.
    ///
    /// Display only: the commit unit re-reads the price while reserving.
    pub unit_price_cents: i64,

    /// Highest quantity this line may reach, from the last stock read.
    pub stock_ceiling: i64,

    /// Quantity in cart, `1..=stock_ceiling` while the ceiling is positive.
    pub quantity: i64,
}

impl CartLine {
    /// Creates a line snapshot at quantity 1.
    ///
    /// The ceiling is capped at [`MAX_ITEM_QUANTITY`].
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        barcode: Option<String>,
        unit_price_cents: i64,
        stock: i64,
    ) -> Self {
        CartLine {
            product_id: product_id.into(),
            name: name.into(),
            barcode,
            unit_price_cents,
            stock_ceiling: clamp_ceiling(stock),
            quantity: 1,
        }
    }

    /// Snapshots a product as read from the ledger.
    pub fn from_product(product: &Product) -> Self {
        CartLine::new(
            product.id.clone(),
            product.name.clone(),
            product.barcode.clone(),
            product.price_cents,
            product.stock,
        )
    }

    /// The de-duplication key of this line.
    pub fn key(&self) -> &str {
        self.barcode.as_deref().unwrap_or(&self.product_id)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

fn clamp_ceiling(stock: i64) -> i64 {
    stock.clamp(0, MAX_ITEM_QUANTITY)
}

// =============================================================================
// Cart Notice
// =============================================================================

/// Outcome of a cart mutation.
///
/// Boundary conditions are normal outcomes and never abort the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartNotice {
    /// A new line was inserted at quantity 1.
    Added,
    /// The line's quantity is now `quantity`.
    QuantityChanged { quantity: i64 },
    /// The request matched the current quantity.
    Unchanged,
    /// The line is already at its stock ceiling; quantity kept.
    StockCeilingReached,
    /// Captured stock is 0; nothing inserted or changed.
    OutOfStock,
    /// The line is already at 1; decrementing further is not removal.
    MinimumQuantityReached,
    /// The cart already holds [`MAX_CART_LINES`] lines.
    CartFull,
    /// No line has the given key.
    NotInCart,
}

impl CartNotice {
    /// True when the cart was modified.
    pub fn changed(&self) -> bool {
        matches!(self, CartNotice::Added | CartNotice::QuantityChanged { .. })
    }
}

impl fmt::Display for CartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartNotice::Added => write!(f, "Added"),
            CartNotice::QuantityChanged { quantity } => write!(f, "Quantity set to {quantity}"),
            CartNotice::Unchanged => write!(f, "No change"),
            CartNotice::StockCeilingReached => write!(f, "Max stock reached"),
            CartNotice::OutOfStock => write!(f, "Out of stock"),
            CartNotice::MinimumQuantityReached => write!(f, "Min qty is 1, use remove"),
            CartNotice::CartFull => write!(f, "Cart is full ({MAX_CART_LINES} lines)"),
            CartNotice::NotInCart => write!(f, "Not in cart"),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Ordered cart lines plus a key index for O(1) lookup.
///
/// ## Invariants
/// - `index[lines[i].key()] == i` for every line
/// - Keys are unique
/// - `1 <= quantity <= stock_ceiling` unless a refresh dropped the ceiling to 0
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    index: HashMap<String, usize>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a scanned product, or bumps the existing line by one.
    ///
    /// ## Behavior
    /// - Key present: the incoming snapshot's stock becomes the new ceiling,
    ///   then the line behaves as `set_quantity(key, quantity + 1)`
    /// - Key absent, stock 0: `OutOfStock`, nothing inserted
    /// - Key absent, cart full: `CartFull`
    /// - Otherwise: inserted at quantity 1, `Added`
    pub fn add_or_increment(&mut self, line: CartLine) -> CartNotice {
        if let Some(&idx) = self.index.get(line.key()) {
            let existing = &mut self.lines[idx];
            existing.stock_ceiling = line.stock_ceiling;
            let desired = existing.quantity + 1;
            return self.set_quantity(line.key(), desired);
        }

        if line.stock_ceiling <= 0 {
            return CartNotice::OutOfStock;
        }

        if self.lines.len() >= MAX_CART_LINES {
            return CartNotice::CartFull;
        }

        let mut line = line;
        line.quantity = 1;
        self.index.insert(line.key().to_string(), self.lines.len());
        self.lines.push(line);
        CartNotice::Added
    }

    /// Sets a line's quantity, clamped into `[1, stock_ceiling]`.
    pub fn set_quantity(&mut self, key: &str, desired: i64) -> CartNotice {
        let Some(&idx) = self.index.get(key) else {
            return CartNotice::NotInCart;
        };
        let line = &mut self.lines[idx];

        if line.stock_ceiling <= 0 {
            return CartNotice::OutOfStock;
        }

        let mut target = desired;

        if target < 1 {
            if line.quantity == 1 {
                return CartNotice::MinimumQuantityReached;
            }
            target = 1;
        }

        if target > line.stock_ceiling {
            if line.quantity == line.stock_ceiling {
                return CartNotice::StockCeilingReached;
            }
            target = line.stock_ceiling;
        }

        if target == line.quantity {
            return CartNotice::Unchanged;
        }

        line.quantity = target;
        CartNotice::QuantityChanged { quantity: target }
    }

    /// Re-captures a line's stock ceiling from a fresh ledger read.
    ///
    /// Quantity is lowered to the new ceiling when it no longer fits. A
    /// ceiling of 0 leaves the line in place so the operator decides; the
    /// commit would fail with `InsufficientStock` for it.
    pub fn refresh_ceiling(&mut self, key: &str, stock: i64) -> CartNotice {
        let Some(&idx) = self.index.get(key) else {
            return CartNotice::NotInCart;
        };
        let line = &mut self.lines[idx];
        line.stock_ceiling = clamp_ceiling(stock);

        if line.stock_ceiling == 0 {
            return CartNotice::OutOfStock;
        }

        if line.quantity > line.stock_ceiling {
            line.quantity = line.stock_ceiling;
            return CartNotice::QuantityChanged {
                quantity: line.quantity,
            };
        }

        CartNotice::Unchanged
    }

    /// Removes a line. Returns `false` (and changes nothing) when absent.
    pub fn remove_line(&mut self, key: &str) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };

        self.lines.remove(idx);
        for (pos, line) in self.lines.iter().enumerate().skip(idx) {
            if let Some(slot) = self.index.get_mut(line.key()) {
                *slot = pos;
            }
        }
        true
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.index.clear();
    }

    /// Σ(quantity × unit price) over the current lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Looks up a line by key.
    pub fn get(&self, key: &str) -> Option<&CartLine> {
        self.index.get(key).map(|&idx| &self.lines[idx])
    }

    /// Line at a 1-based display position, as shown on screen.
    pub fn line_at(&self, position: usize) -> Option<&CartLine> {
        position.checked_sub(1).and_then(|idx| self.lines.get(idx))
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn water(stock: i64) -> CartLine {
        CartLine::new("p-water", "Water", Some("123".to_string()), 999, stock)
    }

    fn bread(stock: i64) -> CartLine {
        CartLine::new("p-bread", "Bread", None, 250, stock)
    }

    fn assert_index_consistent(cart: &Cart) {
        assert_eq!(cart.index.len(), cart.lines.len());
        for (pos, line) in cart.lines.iter().enumerate() {
            assert_eq!(cart.index.get(line.key()), Some(&pos));
        }
    }

    #[test]
    fn test_scan_three_times_hits_ceiling() {
        let mut cart = Cart::new();

        assert_eq!(cart.add_or_increment(water(2)), CartNotice::Added);
        assert_eq!(cart.get("123").map(|l| l.quantity), Some(1));

        assert_eq!(
            cart.add_or_increment(water(2)),
            CartNotice::QuantityChanged { quantity: 2 }
        );
        assert_eq!(
            cart.add_or_increment(water(2)),
            CartNotice::StockCeilingReached
        );

        assert_eq!(cart.get("123").map(|l| l.quantity), Some(2));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total().cents(), 1998);
    }

    #[test]
    fn test_add_out_of_stock_does_not_insert() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_or_increment(water(0)), CartNotice::OutOfStock);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_without_barcode_keys_by_product_id() {
        let mut cart = Cart::new();
        cart.add_or_increment(bread(5));
        cart.add_or_increment(bread(5));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("p-bread").map(|l| l.quantity), Some(2));
    }

    #[test]
    fn test_add_refreshes_ceiling_from_new_snapshot() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(5));
        cart.set_quantity("123", 4);

        // Another terminal sold most of the stock; the next scan sees 2.
        assert_eq!(
            cart.add_or_increment(water(2)),
            CartNotice::QuantityChanged { quantity: 2 }
        );
        assert_eq!(cart.get("123").map(|l| l.stock_ceiling), Some(2));
    }

    #[test]
    fn test_cart_full() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            let line = CartLine::new(format!("p-{i}"), "Item", None, 100, 5);
            assert_eq!(cart.add_or_increment(line), CartNotice::Added);
        }

        let extra = CartLine::new("p-extra", "Extra", None, 100, 5);
        assert_eq!(cart.add_or_increment(extra), CartNotice::CartFull);
        assert_eq!(cart.len(), MAX_CART_LINES);
    }

    #[test]
    fn test_set_quantity_clamps() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(5));

        assert_eq!(
            cart.set_quantity("123", 50),
            CartNotice::QuantityChanged { quantity: 5 }
        );
        assert_eq!(cart.set_quantity("123", 9), CartNotice::StockCeilingReached);
        assert_eq!(
            cart.set_quantity("123", 0),
            CartNotice::QuantityChanged { quantity: 1 }
        );
        assert_eq!(
            cart.set_quantity("123", -3),
            CartNotice::MinimumQuantityReached
        );
        assert_eq!(cart.set_quantity("123", 1), CartNotice::Unchanged);

        // Flooring never removes the line.
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("123").map(|l| l.quantity), Some(1));
    }

    #[test]
    fn test_set_quantity_absent_key() {
        let mut cart = Cart::new();
        assert_eq!(cart.set_quantity("nope", 3), CartNotice::NotInCart);
    }

    #[test]
    fn test_refresh_ceiling() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(5));
        cart.set_quantity("123", 4);

        assert_eq!(
            cart.refresh_ceiling("123", 3),
            CartNotice::QuantityChanged { quantity: 3 }
        );
        assert_eq!(cart.refresh_ceiling("123", 10), CartNotice::Unchanged);
        assert_eq!(cart.refresh_ceiling("123", 0), CartNotice::OutOfStock);
        assert_eq!(cart.set_quantity("123", 2), CartNotice::OutOfStock);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.refresh_ceiling("nope", 1), CartNotice::NotInCart);
    }

    #[test]
    fn test_remove_line_keeps_index_consistent() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(5));
        cart.add_or_increment(bread(5));
        cart.add_or_increment(CartLine::new("p-milk", "Milk", Some("777".into()), 130, 3));

        assert!(cart.remove_line("123"));
        assert_index_consistent(&cart);
        assert_eq!(cart.line_at(1).map(|l| l.name.as_str()), Some("Bread"));
        assert_eq!(cart.line_at(2).map(|l| l.name.as_str()), Some("Milk"));
        assert!(cart.line_at(0).is_none());

        // Re-adding goes to the end.
        cart.add_or_increment(water(5));
        assert_index_consistent(&cart);
        assert_eq!(cart.line_at(3).map(|l| l.key()), Some("123"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(5));
        let before: Vec<CartLine> = cart.lines().to_vec();

        assert!(!cart.remove_line("nope"));
        assert_eq!(cart.lines(), before.as_slice());
        assert_index_consistent(&cart);
    }

    #[test]
    fn test_total_matches_line_sum_after_mixed_ops() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(3));
        cart.add_or_increment(bread(10));
        cart.set_quantity("p-bread", 7);
        cart.add_or_increment(water(3));
        cart.add_or_increment(CartLine::new("p-milk", "Milk", Some("777".into()), 130, 3));
        cart.remove_line("777");
        cart.set_quantity("123", 0);

        let expected: i64 = cart
            .lines()
            .iter()
            .map(|l| l.quantity * l.unit_price_cents)
            .sum();
        assert_eq!(cart.total().cents(), expected);
        assert_eq!(expected, 999 + 7 * 250);
        assert_eq!(cart.total_quantity(), 8);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_or_increment(water(3));
        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.total().is_zero());
        assert_eq!(cart.add_or_increment(water(3)), CartNotice::Added);
    }

    #[test]
    fn test_ceiling_capped_at_max_quantity() {
        let line = CartLine::new("p", "Bulk", None, 1, 50_000);
        assert_eq!(line.stock_ceiling, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_notice_changed() {
        assert!(CartNotice::Added.changed());
        assert!(CartNotice::QuantityChanged { quantity: 2 }.changed());
        assert!(!CartNotice::StockCeilingReached.changed());
        assert_eq!(CartNotice::StockCeilingReached.to_string(), "Max stock reached");
    }
}
