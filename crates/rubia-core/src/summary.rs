//! Plain-text sale summary for sharing with the customer.
//!
//! The shareable rendition of the sale receipt: items, totals and the
//! installment plan with paid markers. Image rendering stays outside the
//! core; this text is what the reminder channel and the operator copy.

use chrono::NaiveDate;

use crate::ledger::{installment_status, summarize, InstallmentStatus};
use crate::types::{Installment, Sale, SaleItem};

/// Renders a sale and its installment rows as a plain-text summary.
pub fn sale_summary(
    sale: &Sale,
    client_name: &str,
    items: &[SaleItem],
    installments: &[Installment],
    today: NaiveDate,
) -> String {
    let mut out = String::new();

    out.push_str("RUBIA JOIAS - SALE SUMMARY\n");
    out.push_str(&format!("Client: {}\n", client_name));
    out.push_str(&format!("Date: {}\n", sale.sold_at.format("%Y-%m-%d")));
    out.push_str(&format!("Payment: {}\n\n", sale.payment_method.label()));

    out.push_str("Items:\n");
    for item in items {
        out.push_str(&format!(
            "  {} x{} @ {} = {}\n",
            item.description_snapshot,
            item.quantity,
            item.unit_price(),
            item.line_total()
        ));
    }
    out.push_str(&format!("Total: {}\n", sale.total()));

    if !installments.is_empty() {
        out.push_str("\nInstallments:\n");
        for row in installments {
            let marker = match installment_status(row, today) {
                InstallmentStatus::Paid => "paid",
                InstallmentStatus::Overdue => "OVERDUE",
                InstallmentStatus::DueToday => "due today",
                InstallmentStatus::Upcoming => "open",
            };
            out.push_str(&format!(
                "  #{} {} due {} [{}]",
                row.number,
                row.amount(),
                row.due_date,
                marker
            ));
            if let Some(note) = &row.note {
                out.push_str(&format!(" - {}", note));
            }
            out.push('\n');
        }

        let totals = summarize(installments);
        out.push_str(&format!(
            "Paid: {}  Pending: {}\n",
            totals.total_paid, totals.total_pending
        ));
    }

    out
}
