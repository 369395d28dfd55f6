//! # tally-core: Pure Business Logic for Tally POS
//!
//! The in-memory half of the sale engine. Everything here is deterministic
//! and free of I/O; the storage half (ledger, commit unit) lives in
//! `tally-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Terminal (text menu + scan dispatch)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ checkout  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │ SaleReq.  │  │   │
//! │  │   │   Sale    │  │           │  │ CartLine  │  │  Phase    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SaleRequest                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         tally-db (ledger, commit unit, repositories)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, SaleItem)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - The sale builder: lines, clamping, totals
//! - [`checkout`] - Commit preconditions and the checkout phase machine
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::cart::{Cart, CartLine, CartNotice};
//!
//! let mut cart = Cart::new();
//! let line = CartLine::new("p-1", "Sparkling Water", Some("123".into()), 999, 2);
//!
//! assert_eq!(cart.add_or_increment(line.clone()), CartNotice::Added);
//! cart.add_or_increment(line.clone());
//! assert_eq!(cart.add_or_increment(line), CartNotice::StockCeilingReached);
//! assert_eq!(cart.total().cents(), 1998);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartNotice};
pub use checkout::{CheckoutPhase, CheckoutSession, SaleLine, SaleRequest};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity accepted for a single stock movement or cart line.
///
/// Guards against a mistyped quantity (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default number of rows returned by fuzzy product search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
