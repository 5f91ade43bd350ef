//! # Domain Types
//!
//! Core domain types used throughout Rubia POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │      Sale       │   │   Installment   │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  code (QR)      │   │  client_id (FK) │   │  sale_id (FK)   │        │
//! │  │  price_cents    │   │  total_cents    │   │  kind + number  │        │
//! │  │  stock_quantity │   │  payment_method │   │  amount_cents   │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  Payable / PayableInstallment mirror Sale / Installment on the          │
//! │  supplier side (no renegotiation, no down payments).                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products carry both:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: 8-digit numeric business id - the QR payload shown to customers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// All methods except [`PaymentMethod::Installment`] settle immediately;
/// the checkout still records a single paid installment for them so every
/// sale is traceable in the credit ledger.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,
    /// Credit card on an external terminal.
    CreditCard,
    /// Debit card on an external terminal.
    DebitCard,
    /// Physical cash payment.
    Cash,
    /// Store credit ("crediário") - settled through the installment ledger.
    Installment,
}

impl PaymentMethod {
    /// Human-readable label used in installment notes and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::CreditCard => "credit card",
            PaymentMethod::DebitCard => "debit card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Installment => "installment plan",
        }
    }

    /// Whether this method settles through the installment ledger.
    #[inline]
    pub fn is_installment(&self) -> bool {
        matches!(self, PaymentMethod::Installment)
    }
}

// =============================================================================
// Installment Kind
// =============================================================================

/// What an installment row represents.
///
/// The store's previous system encoded this into the installment number
/// itself (0 for down payments, 9000+ for renegotiated rows). Here intent is
/// an explicit variant and `number` is a plain monotonic sequence per sale,
/// so ordering by number stays chronological without magic bands.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentKind {
    /// An ordinary scheduled installment (1..N at checkout).
    Regular,
    /// A down payment captured at sale time (number 0).
    DownPayment,
    /// A scheduled installment created by a renegotiation.
    Renegotiated,
    /// A down payment captured at renegotiation time.
    RenegotiationDownPayment,
}

// =============================================================================
// Client / Supplier
// =============================================================================

/// A customer of the store.
///
/// Plain reference entity: create/delete only; delete is blocked while any
/// sale references the client.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// CPF - unique per client.
    pub tax_id: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// A supplier of merchandise (mirror of [`Client`] on the payable side).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    /// CPF/CNPJ - may be blank for informal suppliers.
    pub tax_id: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// 8-digit numeric business code - the QR payload.
    pub code: String,

    /// Display name shown to the operator and in the catalog.
    pub description: String,

    /// Category (rings, necklaces, ...).
    pub category: String,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Acquisition cost in cents (for margin visibility).
    pub cost_cents: Option<i64>,

    /// Current stock level - never negative.
    pub stock_quantity: i64,

    /// Public URL of the product photo, if one was uploaded.
    pub image_url: Option<String>,

    /// Provenance: the supplier invoice that stocked this product.
    pub payable_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub client_id: String,
    pub sold_at: DateTime<Utc>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product description at time of sale (frozen).
    pub description_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Installment (receivable)
// =============================================================================

/// One scheduled partial payment belonging to a sale.
///
/// Rows are never deleted by renegotiation: cancelled rows are marked paid
/// with a cancellation note so the audit trail stays intact.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: String,
    pub sale_id: String,
    pub kind: InstallmentKind,
    /// Monotonic per sale: 0 for the checkout down payment, 1..N for the
    /// ordinary schedule, renegotiated rows continue above the current max.
    pub number: i64,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid: bool,
    /// Set exactly when `paid` is true.
    pub paid_at: Option<NaiveDate>,
    /// Free-text provenance: payment method, down payment, cancellation.
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Installment {
    /// Returns the installment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Payable (supplier invoice)
// =============================================================================

/// A supplier invoice to be paid in fixed monthly installments.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payable {
    pub id: String,
    pub supplier_id: String,
    pub description: String,
    pub total_cents: i64,
    pub installment_count: i64,
    pub invoice_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

impl Payable {
    /// Returns the invoice total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One scheduled payment of a supplier invoice.
///
/// Simpler than the receivable side: no kinds, no down payments, no
/// renegotiation.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayableInstallment {
    pub id: String,
    pub payable_id: String,
    pub number: i64,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid: bool,
}

impl PayableInstallment {
    /// Returns the installment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

/// Singleton configuration record for the WhatsApp reminder dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub id: String,
    /// Destination phone, E.164 without the leading '+'.
    pub whatsapp_phone: String,
    /// CallMeBot API key for that phone.
    pub api_key: String,
    /// Daily send time, "HH:MM" (honored by the external scheduler).
    pub send_time: String,
    /// Look-ahead day offsets, e.g. [3, 2, 0] = "3 days before, 2 days
    /// before, due today".
    pub lead_days: Vec<i64>,
    pub active: bool,
    pub send_on_weekends: bool,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
