//! # rubia-core: Pure Business Logic for Rubia POS
//!
//! This crate is the **heart** of Rubia POS. It contains the installment
//! ledger engine and every other business rule as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rubia POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 Operator-facing surfaces                        │    │
//! │  │     Checkout ──► Credit ledger ──► Payables ──► Dashboard       │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ rubia-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │ schedule  │  │  ledger   │    │    │
//! │  │   │  Product  │  │   Money   │  │ checkout  │  │  status   │    │    │
//! │  │   │   Sale    │  │  (cents)  │  │ renegoc.  │  │  summary  │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    rubia-db (Database Layer)                    │    │
//! │  │        SQLite queries, migrations, atomic transactions          │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Installment, Payable, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`schedule`] - Installment schedule generation and renegotiation
//! - [`ledger`] - Status derivation and paid/pending summaries
//! - [`cart`] - Checkout cart with stock ceilings
//! - [`validation`] - Input validation rules
//! - [`summary`] - Plain-text sale summary
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; "today" is a parameter
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); equal splits
//!    put the remainder on the last installment so schedules reconcile
//!    exactly
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod schedule;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart line.
///
/// Guards against fat-finger quantities (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum installment count for a schedule (checkout, renegotiation or
/// payable). Five years of monthly installments is already far beyond what
/// the store offers.
pub const MAX_INSTALLMENT_COUNT: usize = 60;
