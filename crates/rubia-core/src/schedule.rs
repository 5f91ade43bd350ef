//! # Installment Schedule Engine
//!
//! Derives the installment rows for a sale at checkout, the replacement rows
//! for a renegotiation, and the fixed monthly plan for a supplier invoice.
//! Everything here is pure: the database layer applies the produced plan
//! inside a single transaction.
//!
//! ## Checkout Decision Tree
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout_schedule(total, method, terms, today)                         │
//! │                                                                         │
//! │  method != INSTALLMENT                                                  │
//! │      └── 1 row: Regular #1, amount = total, due today, PAID             │
//! │          (every sale leaves a trace in the credit ledger)               │
//! │                                                                         │
//! │  method == INSTALLMENT, N == 1                                          │
//! │      └── 1 row: Regular #1, amount = total, due today, UNPAID           │
//! │                                                                         │
//! │  method == INSTALLMENT, N > 1                                           │
//! │      ├── down payment D > 0? → DownPayment #0, amount = D, PAID today   │
//! │      └── N rows: Regular #1..#N, split of (total - D), due +1..+N mo    │
//! │                                                                         │
//! │  Reconciliation: rows always sum EXACTLY to total (remainder of the     │
//! │  equal split goes to the last installment).                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Renegotiation
//! The plan produced by [`renegotiation_schedule`] covers only the NEW rows;
//! cancelling the old unpaid rows (mark paid + cancellation note, never
//! delete) is the repository's half of the operation. Renegotiation only
//! restructures the pending balance - it never creates new principal.

use chrono::{Months, NaiveDate};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InstallmentKind, PaymentMethod};
use crate::MAX_INSTALLMENT_COUNT;

// =============================================================================
// Plan Types
// =============================================================================

/// An installment row about to be written, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstallment {
    pub kind: InstallmentKind,
    pub number: i64,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub paid: bool,
    pub paid_at: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Terms chosen by the operator for an installment-method sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentTerms {
    /// Number of scheduled installments (N >= 1).
    pub count: u32,
    /// Optional down payment captured at sale time (0 <= D <= total).
    pub down_payment: Money,
}

// =============================================================================
// Equal Split
// =============================================================================

/// Splits an amount into `parts` equal installments, assigning the division
/// remainder to the LAST part so the pieces always sum back exactly.
///
/// ## Example
/// ```rust
/// use rubia_core::money::Money;
/// use rubia_core::schedule::split_evenly;
///
/// let parts = split_evenly(Money::from_cents(10000), 3);
/// assert_eq!(parts.iter().map(|m| m.cents()).collect::<Vec<_>>(), vec![3333, 3333, 3334]);
/// ```
pub fn split_evenly(total: Money, parts: u32) -> Vec<Money> {
    debug_assert!(parts >= 1, "split_evenly requires at least one part");
    let parts = parts as i64;
    let base = total.cents() / parts;
    let mut amounts = vec![Money::from_cents(base); parts as usize];
    // Whatever integer division dropped lands on the final installment.
    amounts[parts as usize - 1] = Money::from_cents(total.cents() - base * (parts - 1));
    amounts
}

/// Due date `months` calendar months after `start`.
///
/// Calendar stepping, not fixed 30-day hops: Jan 31 + 1 month clamps to the
/// end of February.
fn due_in_months(start: NaiveDate, months: u32) -> CoreResult<NaiveDate> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "due_date".to_string(),
                reason: format!("cannot add {} months to {}", months, start),
            }
            .into()
        })
}

// =============================================================================
// Checkout Schedule
// =============================================================================

/// Derives the installment schedule created when a sale is finalized.
///
/// ## Arguments
/// * `total` - sale total (must be positive)
/// * `method` - payment method chosen at checkout
/// * `terms` - installment count and down payment; required when (and only
///   meaningful when) `method` is [`PaymentMethod::Installment`]
/// * `today` - the sale date
///
/// ## Errors
/// * total <= 0, N < 1, D < 0, or D > total
/// * missing terms for an installment sale
/// * a nonzero down payment with N == 1 (the single-installment path has no
///   slot for it; rejecting beats silently dropping money)
pub fn checkout_schedule(
    total: Money,
    method: PaymentMethod,
    terms: Option<InstallmentTerms>,
    today: NaiveDate,
) -> CoreResult<Vec<PlannedInstallment>> {
    if !total.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "sale total".to_string(),
        }
        .into());
    }

    if !method.is_installment() {
        // Cash-like sale: one installment already settled, so the credit
        // ledger shows every sale regardless of payment type.
        return Ok(vec![PlannedInstallment {
            kind: InstallmentKind::Regular,
            number: 1,
            amount: total,
            due_date: today,
            paid: true,
            paid_at: Some(today),
            note: Some(format!("Paid in full - {}", method.label())),
        }]);
    }

    let terms = terms.ok_or_else(|| ValidationError::Required {
        field: "installment terms".to_string(),
    })?;
    validate_terms(terms, total)?;

    let down = terms.down_payment;

    if terms.count == 1 {
        if down.is_positive() {
            return Err(ValidationError::OutOfRange {
                field: "down payment".to_string(),
                min: 0,
                max: 0,
            }
            .into());
        }
        return Ok(vec![PlannedInstallment {
            kind: InstallmentKind::Regular,
            number: 1,
            amount: total,
            due_date: today,
            paid: false,
            paid_at: None,
            note: None,
        }]);
    }

    let mut rows = Vec::with_capacity(terms.count as usize + 1);

    if down.is_positive() {
        rows.push(PlannedInstallment {
            kind: InstallmentKind::DownPayment,
            number: 0,
            amount: down,
            due_date: today,
            paid: true,
            paid_at: Some(today),
            note: Some("Down payment".to_string()),
        });
    }

    let balance = total - down;
    for (i, amount) in split_evenly(balance, terms.count).into_iter().enumerate() {
        let number = i as i64 + 1;
        rows.push(PlannedInstallment {
            kind: InstallmentKind::Regular,
            number,
            amount,
            due_date: due_in_months(today, number as u32)?,
            paid: false,
            paid_at: None,
            note: None,
        });
    }

    Ok(rows)
}

fn validate_terms(terms: InstallmentTerms, total: Money) -> CoreResult<()> {
    if terms.count < 1 || terms.count as usize > MAX_INSTALLMENT_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "installment count".to_string(),
            min: 1,
            max: MAX_INSTALLMENT_COUNT as i64,
        }
        .into());
    }
    if terms.down_payment.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "down payment".to_string(),
            min: 0,
            max: total.cents(),
        }
        .into());
    }
    if terms.down_payment > total {
        return Err(ValidationError::DownPaymentExceedsTotal {
            down_cents: terms.down_payment.cents(),
            total_cents: total.cents(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Renegotiation Schedule
// =============================================================================

/// Note written onto the cancelled rows when a renegotiation is applied.
pub fn renegotiation_cancel_note(today: NaiveDate) -> String {
    format!("Cancelled by renegotiation on {}", today)
}

/// Derives the replacement rows for a renegotiation.
///
/// ## Arguments
/// * `pending` - sum of the sale's unpaid installment amounts (must be > 0)
/// * `down_payment` - new down payment (0 <= D' <= pending)
/// * `count` - new installment count M (>= 1)
/// * `next_number` - first free installment number for the sale (one above
///   the current maximum), keeping per-sale numbering monotonic
/// * `today` - renegotiation date
///
/// The new unpaid rows sum exactly to `pending - down_payment`: the operation
/// restructures existing debt, it never creates principal.
pub fn renegotiation_schedule(
    pending: Money,
    down_payment: Money,
    count: u32,
    next_number: i64,
    today: NaiveDate,
) -> CoreResult<Vec<PlannedInstallment>> {
    if !pending.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "pending balance".to_string(),
        }
        .into());
    }
    if count < 1 || count as usize > MAX_INSTALLMENT_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "installment count".to_string(),
            min: 1,
            max: MAX_INSTALLMENT_COUNT as i64,
        }
        .into());
    }
    if down_payment.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "down payment".to_string(),
            min: 0,
            max: pending.cents(),
        }
        .into());
    }
    if down_payment > pending {
        return Err(ValidationError::DownPaymentExceedsPending {
            down_cents: down_payment.cents(),
            pending_cents: pending.cents(),
        }
        .into());
    }

    let mut rows = Vec::with_capacity(count as usize + 1);
    let mut number = next_number;

    if down_payment.is_positive() {
        rows.push(PlannedInstallment {
            kind: InstallmentKind::RenegotiationDownPayment,
            number,
            amount: down_payment,
            due_date: today,
            paid: true,
            paid_at: Some(today),
            note: Some("Renegotiation down payment".to_string()),
        });
        number += 1;
    }

    let balance = pending - down_payment;
    for (i, amount) in split_evenly(balance, count).into_iter().enumerate() {
        rows.push(PlannedInstallment {
            kind: InstallmentKind::Renegotiated,
            number,
            amount,
            due_date: due_in_months(today, i as u32 + 1)?,
            paid: false,
            paid_at: None,
            note: None,
        });
        number += 1;
    }

    Ok(rows)
}

// =============================================================================
// Payable Schedule
// =============================================================================

/// A payable installment row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPayableInstallment {
    pub number: i64,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// Derives the fixed monthly plan for a supplier invoice: `count` equal
/// installments starting one month out. No down payment, no renegotiation.
pub fn payable_schedule(
    total: Money,
    count: u32,
    today: NaiveDate,
) -> CoreResult<Vec<PlannedPayableInstallment>> {
    if !total.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "invoice total".to_string(),
        }
        .into());
    }
    if count < 1 || count as usize > MAX_INSTALLMENT_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "installment count".to_string(),
            min: 1,
            max: MAX_INSTALLMENT_COUNT as i64,
        }
        .into());
    }

    split_evenly(total, count)
        .into_iter()
        .enumerate()
        .map(|(i, amount)| {
            let number = i as i64 + 1;
            Ok(PlannedPayableInstallment {
                number,
                amount,
                due_date: due_in_months(today, number as u32)?,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
