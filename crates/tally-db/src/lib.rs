//! # tally-db: Database Layer for Tally POS
//!
//! SQLite storage for the catalog, customers and committed sales, plus the
//! two pieces that keep stock honest: the inventory ledger and the sale
//! commit unit.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  Terminal command (finalize_sale)                                      │
//! │       │  SaleRequest (from tally-core)                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐   │   │
//! │  │   │   Database    │  │ CheckoutSvc   │  │  Repositories    │   │   │
//! │  │   │   (pool.rs)   │  │ commit/delete │  │ product/customer │   │   │
//! │  │   │               │  │      │        │  │      /sale       │   │   │
//! │  │   │ SqlitePool    │  │      ▼        │  └──────────────────┘   │   │
//! │  │   │ Migrations    │  │ ledger::      │                          │   │
//! │  │   │ Backups       │  │ reserve/      │                          │   │
//! │  │   └───────────────┘  │ release       │                          │   │
//! │  │                      └───────────────┘                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) ~/.local/share/tally/tally.db                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`ledger`] - Conditional stock decrement / increment
//! - [`checkout`] - Sale commit and delete units
//! - [`repository`] - Product, customer and sale repositories
//! - [`migrations`] - Embedded database migrations
//! - [`backup`] - `VACUUM INTO` snapshots
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let request = cart.to_sale_request(Some(&customer_id))?;
//! let sale_id = db.checkout().commit_sale(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod checkout;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutService, RestoredLine};
pub use error::{DbError, DbResult};
pub use ledger::{InventoryLedger, PriceAndStock, Reservation};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{CustomerRepository, ProductRepository, SaleRepository};
