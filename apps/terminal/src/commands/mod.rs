//! # Terminal Commands
//!
//! Plain async functions the menu calls. Each takes the state it needs by
//! reference and returns a DTO or an [`ApiError`](crate::error::ApiError).
//!
//! ## Command Categories
//! - **cart**: checkout cart edits
//! - **sale**: finalize, receipts, history, delete
//! - **product**: catalog lookup, edit, restock, write-off
//! - **customer**: customer records
//! - **backup**: database snapshot

pub mod backup;
pub mod cart;
pub mod customer;
pub mod product;
pub mod sale;
