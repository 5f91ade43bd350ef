//! # Error Types
//!
//! Domain-specific error types for rubia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rubia-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  rubia-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                         (unique/foreign-key violations, I/O)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → operator                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product code, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Validation errors are raised BEFORE any write - no partial state

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Nothing that affects
/// money is ever swallowed; every failure propagates to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (unknown id or QR code).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// Raised at commit time, not only at add-to-cart time, to defend
    /// against stale cart state.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Renegotiation requested on a sale with no unpaid installments.
    #[error("Sale {0} has no pending balance to renegotiate")]
    NothingToRenegotiate(String),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when operator input doesn't meet requirements and are raised
/// before business logic runs.
#[derive(Debug, Error)]
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

    /// Invalid format (e.g. malformed product code, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Down payment larger than the sale total at checkout.
    #[error("down payment ({down_cents} cents) exceeds sale total ({total_cents} cents)")]
    DownPaymentExceedsTotal { down_cents: i64, total_cents: i64 },

    /// Down payment larger than the pending balance at renegotiation.
    #[error("down payment ({down_cents} cents) exceeds pending balance ({pending_cents} cents)")]
    DownPaymentExceedsPending { down_cents: i64, pending_cents: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
