//! # State Module
//!
//! Long-lived state for the terminal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   DbState    │  │   ConfigState    │  │  CheckoutSession         │  │
//! │  │              │  │                  │  │  (tally-core)            │  │
//! │  │  Database    │  │  store_name      │  │                          │  │
//! │  │  (SQLite     │  │  currency        │  │  cart + customer + phase │  │
//! │  │   pool)      │  │  timings         │  │                          │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  OWNERSHIP:                                                            │
//! │  • DbState: cloned into scan workers (pool is thread-safe)             │
//! │  • ConfigState: read-only after startup                                │
//! │  • CheckoutSession: owned by the foreground menu task, no Mutex        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::{ConfigError, ConfigState};
pub use db::DbState;
