//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures (stock, preconditions)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures, wraps CoreError as Domain    │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → screen       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart boundary conditions (out of stock, ceiling reached, minimum quantity)
//! are not errors. They are reported as [`crate::cart::CartNotice`] values.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is recoverable from the operator's point of view: the
/// attempted operation is abandoned and the session continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in database
    /// - Product was soft-deleted between scan and commit
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## When This Occurs
    /// - Another terminal sold the last units after the line was added
    /// - A write-off asks for more than is on hand
    ///
    /// ## User Workflow
    /// ```text
    /// Finalize (Water × 3)
    ///      │
    ///      ▼
    /// reserve(water, 3): stock is 1
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Water", available: 1, requested: 3 }
    ///      │
    ///      ▼
    /// Whole sale rolled back; operator lowers qty or removes the line
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Finalize was attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Finalize was attempted before a customer was chosen.
    #[error("A customer must be selected before finalizing")]
    MissingCustomer,

    /// A line or stock movement carries a non-positive or oversized quantity.
    #[error("Invalid quantity {quantity} for {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic or storage access runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
