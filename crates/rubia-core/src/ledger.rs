//! # Ledger Derivation
//!
//! Pure read-side functions over installment rows: per-row status and
//! per-sale paid/pending summaries. Nothing here is cached or stored - the
//! values are recomputed on every read so they always reflect the latest
//! rows, including rows cancelled by a renegotiation (which count as paid).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Installment, PayableInstallment};

// =============================================================================
// Status
// =============================================================================

/// Derived status of a single installment relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Paid,
    Overdue,
    DueToday,
    Upcoming,
}

/// Derives the status of a receivable installment.
///
/// `paid` wins over everything; otherwise the due date decides.
pub fn installment_status(installment: &Installment, today: NaiveDate) -> InstallmentStatus {
    status_from(installment.paid, installment.due_date, today)
}

/// Derives the status of a payable installment (same rule, mirrored side).
pub fn payable_installment_status(
    installment: &PayableInstallment,
    today: NaiveDate,
) -> InstallmentStatus {
    status_from(installment.paid, installment.due_date, today)
}

fn status_from(paid: bool, due_date: NaiveDate, today: NaiveDate) -> InstallmentStatus {
    if paid {
        InstallmentStatus::Paid
    } else if due_date < today {
        InstallmentStatus::Overdue
    } else if due_date == today {
        InstallmentStatus::DueToday
    } else {
        InstallmentStatus::Upcoming
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Paid/pending aggregation over one sale's installment rows.
///
/// Every row is either paid or not, so `total_paid + total_pending` always
/// equals the sum of all installment amounts for the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_paid: Money,
    pub total_pending: Money,
}

/// Summarizes a sale's installment rows into paid and pending totals.
pub fn summarize(installments: &[Installment]) -> LedgerSummary {
    let mut summary = LedgerSummary::default();
    for row in installments {
        if row.paid {
            summary.total_paid += row.amount();
        } else {
            summary.total_pending += row.amount();
        }
    }
    summary
}

/// The sale's pending balance: sum of unpaid installment amounts.
///
/// This is the `P` that a renegotiation restructures.
pub fn pending_balance(installments: &[Installment]) -> Money {
    installments
        .iter()
        .filter(|row| !row.paid)
        .map(|row| row.amount())
        .sum()
}

/// First free installment number for a sale (one above the current maximum).
///
/// Keeps per-sale numbering monotonic across renegotiations; for a sale with
/// no rows yet this is 1.
pub fn next_installment_number(installments: &[Installment]) -> i64 {
    installments.iter().map(|row| row.number).max().unwrap_or(0) + 1
}

// =============================================================================
// Unit Tests
// =============================================================================
