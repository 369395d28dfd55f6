//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Terminal command                                                      │
//! │       │  db.products().search("cola", 50)                              │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / SaleRepository               │
//! │       │  SQL                                                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock changes and sale writes are not here: see [`crate::ledger`] and
//! [`crate::checkout`].
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product catalog and search
//! - [`CustomerRepository`] - Customer CRUD
//! - [`SaleRepository`] - Committed sale reads

pub mod customer;
pub mod product;
pub mod sale;

pub use customer::CustomerRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
