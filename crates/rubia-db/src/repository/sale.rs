//! # Sale Repository
//!
//! Checkout, the receivable installment ledger, and renegotiation.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT (one transaction)                                          │
//! │     ├── insert sale                                                     │
//! │     ├── insert line items (frozen product snapshots)                    │
//! │     ├── decrement stock, guarded: stock_quantity >= qty                 │
//! │     └── insert the installment schedule from rubia-core                 │
//! │     A failure at ANY step rolls everything back - stale carts cannot    │
//! │     oversell and a half-written schedule never survives.                │
//! │                                                                         │
//! │  2. LEDGER MUTATIONS                                                    │
//! │     ├── toggle_paid()          - mark one installment paid/unpaid       │
//! │     ├── update_installment()   - manual edit escape hatch               │
//! │     └── renegotiate()          - cancel unpaid rows + new schedule,     │
//! │                                  one transaction                        │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                   │
//! │     └── cascades to items and installments                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rubia_core::cart::Cart;
use rubia_core::ledger::{next_installment_number, pending_balance, summarize, LedgerSummary};
use rubia_core::schedule::{
    checkout_schedule, renegotiation_cancel_note, renegotiation_schedule, InstallmentTerms,
    PlannedInstallment,
};
use rubia_core::validation::validate_price_cents;
use rubia_core::{CoreError, Installment, Money, PaymentMethod, Sale, SaleItem};

const SALE_COLUMNS: &str = "id, client_id, sold_at, total_cents, payment_method, created_at";
const INSTALLMENT_COLUMNS: &str =
    "id, sale_id, kind, number, amount_cents, due_date, paid, paid_at, note, created_at";

/// Repository for sale and installment-ledger operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Finalizes a sale: creates the sale row, its line items, its
    /// installment schedule, and decrements stock - all in one transaction.
    ///
    /// ## Arguments
    /// * `client_id` - the buying client
    /// * `cart` - non-empty cart with frozen product snapshots
    /// * `method` - payment method
    /// * `terms` - installment count and down payment (installment method only)
    ///
    /// ## Errors
    /// * Validation failures (empty cart, bad terms) before any write
    /// * `CoreError::InsufficientStock` when any line exceeds the stock
    ///   found at commit time - the whole operation rolls back
    /// * `DbError::ForeignKeyViolation` for an unknown client
    pub async fn checkout(
        &self,
        client_id: &str,
        cart: &Cart,
        method: PaymentMethod,
        terms: Option<InstallmentTerms>,
    ) -> DbResult<Sale> {
        if cart.is_empty() {
            return Err(CoreError::Validation(rubia_core::ValidationError::Required {
                field: "cart".to_string(),
            })
            .into());
        }

        let now = Utc::now();
        let today = now.date_naive();
        let total = cart.total();

        // The whole schedule is derived and validated before the first write.
        let plan = checkout_schedule(total, method, terms, today)?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            sold_at: now,
            total_cents: total.cents(),
            payment_method: method,
            created_at: now,
        };

        debug!(sale_id = %sale.id, total = %total, items = cart.item_count(), "Starting checkout");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, client_id, sold_at, total_cents, payment_method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.client_id)
        .bind(sale.sold_at)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, product_id, description_snapshot, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?;

            // Guarded decrement: the authoritative stock check. A cart built
            // against stale stock fails here and the transaction unwinds.
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock_quantity >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match available {
                    None => CoreError::ProductNotFound(line.product_id.clone()).into(),
                    Some(available) => CoreError::InsufficientStock {
                        code: line.code.clone(),
                        available,
                        requested: line.quantity,
                    }
                    .into(),
                });
            }
        }

        insert_planned(&mut tx, &sale.id, &plan, now).await?;

        tx.commit().await?;

        info!(sale_id = %sale.id, total = %total, method = ?method, "Sale finalized");

        Ok(sale)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE id = ?1",
            SALE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists sales newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales ORDER BY sold_at DESC",
            SALE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets all line items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, description_snapshot, quantity, unit_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale's full installment history ordered by number.
    ///
    /// Includes rows cancelled by past renegotiations - the audit trail is
    /// part of the ledger.
    pub async fn get_installments(&self, sale_id: &str) -> DbResult<Vec<Installment>> {
        let rows = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {} FROM sale_installments WHERE sale_id = ?1 ORDER BY number",
            INSTALLMENT_COLUMNS
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Paid/pending totals for a sale, recomputed from the rows on every
    /// call - never cached.
    pub async fn summary(&self, sale_id: &str) -> DbResult<LedgerSummary> {
        let rows = self.get_installments(sale_id).await?;
        Ok(summarize(&rows))
    }

    // =========================================================================
    // Ledger Mutations
    // =========================================================================

    /// Flips one installment between paid and unpaid.
    ///
    /// The payment date always tracks the LAST transition to paid; flipping
    /// back to unpaid clears it.
    pub async fn toggle_paid(&self, installment_id: &str) -> DbResult<Installment> {
        let row = self.get_installment(installment_id).await?;

        let paid = !row.paid;
        let paid_at = if paid { Some(Utc::now().date_naive()) } else { None };

        debug!(installment_id = %installment_id, paid = %paid, "Toggling installment");

        sqlx::query("UPDATE sale_installments SET paid = ?2, paid_at = ?3 WHERE id = ?1")
            .bind(installment_id)
            .bind(paid)
            .bind(paid_at)
            .execute(&self.pool)
            .await?;

        self.get_installment(installment_id).await
    }

    /// Manual edit escape hatch: overwrites one installment's amount, due
    /// date and paid flag.
    ///
    /// Setting paid keeps an existing payment date (or stamps today);
    /// clearing paid clears it. Editing an amount does NOT rebalance the
    /// sale's other installments - the sale-total invariant can drift. This
    /// is accepted operator behavior, not silently fixed.
    pub async fn update_installment(
        &self,
        installment_id: &str,
        amount: Money,
        due_date: chrono::NaiveDate,
        paid: bool,
    ) -> DbResult<Installment> {
        validate_price_cents(amount.cents()).map_err(CoreError::from)?;

        let row = self.get_installment(installment_id).await?;

        let paid_at = if paid {
            row.paid_at.or_else(|| Some(Utc::now().date_naive()))
        } else {
            None
        };

        debug!(installment_id = %installment_id, amount = %amount, "Editing installment");

        sqlx::query(
            r#"
            UPDATE sale_installments
            SET amount_cents = ?2, due_date = ?3, paid = ?4, paid_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(installment_id)
        .bind(amount.cents())
        .bind(due_date)
        .bind(paid)
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        self.get_installment(installment_id).await
    }

    /// Renegotiates a sale's pending balance into a new schedule.
    ///
    /// One transaction: cancels every currently-unpaid installment (marked
    /// paid with a cancellation note - never deleted, the original amounts
    /// and due dates stay visible) and inserts the replacement rows numbered
    /// above the sale's current maximum. May be invoked repeatedly; rows
    /// settled or cancelled earlier are untouched.
    ///
    /// ## Errors
    /// * `CoreError::NothingToRenegotiate` when no installment is unpaid
    /// * down payment > pending balance → ValidationError, nothing mutated
    pub async fn renegotiate(
        &self,
        sale_id: &str,
        down_payment: Money,
        count: u32,
    ) -> DbResult<Vec<Installment>> {
        let now = Utc::now();
        let today = now.date_naive();

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {} FROM sale_installments WHERE sale_id = ?1 ORDER BY number",
            INSTALLMENT_COLUMNS
        ))
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        if existing.is_empty() {
            return Err(DbError::not_found("Sale", sale_id));
        }
        if existing.iter().all(|row| row.paid) {
            return Err(CoreError::NothingToRenegotiate(sale_id.to_string()).into());
        }

        let pending = pending_balance(&existing);
        let next_number = next_installment_number(&existing);

        // Validates (including D' > P) before the first write.
        let plan = renegotiation_schedule(pending, down_payment, count, next_number, today)?;

        let cancelled = sqlx::query(
            r#"
            UPDATE sale_installments
            SET paid = 1, paid_at = ?2, note = ?3
            WHERE sale_id = ?1 AND paid = 0
            "#,
        )
        .bind(sale_id)
        .bind(today)
        .bind(renegotiation_cancel_note(today))
        .execute(&mut *tx)
        .await?;

        let created = insert_planned(&mut tx, sale_id, &plan, now).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            pending = %pending,
            down_payment = %down_payment,
            cancelled = cancelled.rows_affected(),
            new_rows = created.len(),
            "Sale renegotiated"
        );

        Ok(created)
    }

    /// Deletes a sale; items and installments cascade with it.
    ///
    /// Stock is NOT restored - a deleted sale is an erasure of a mistaken
    /// record, not a return flow.
    pub async fn delete(&self, sale_id: &str) -> DbResult<()> {
        debug!(sale_id = %sale_id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    async fn get_installment(&self, id: &str) -> DbResult<Installment> {
        sqlx::query_as::<_, Installment>(&format!(
            "SELECT {} FROM sale_installments WHERE id = ?1",
            INSTALLMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Installment", id))
    }
}

/// Inserts planned rows for a sale and returns them as stored installments.
async fn insert_planned(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
    plan: &[PlannedInstallment],
    now: chrono::DateTime<Utc>,
) -> DbResult<Vec<Installment>> {
    let mut created = Vec::with_capacity(plan.len());

    for row in plan {
        let installment = Installment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            kind: row.kind,
            number: row.number,
            amount_cents: row.amount.cents(),
            due_date: row.due_date,
            paid: row.paid,
            paid_at: row.paid_at,
            note: row.note.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sale_installments
                (id, sale_id, kind, number, amount_cents, due_date, paid, paid_at, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&installment.id)
        .bind(&installment.sale_id)
        .bind(installment.kind)
        .bind(installment.number)
        .bind(installment.amount_cents)
        .bind(installment.due_date)
        .bind(installment.paid)
        .bind(installment.paid_at)
        .bind(&installment.note)
        .bind(installment.created_at)
        .execute(&mut **tx)
        .await?;

        created.push(installment);
    }

    Ok(created)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::client::NewClient;
    use crate::repository::product::NewProduct;
    use chrono::Months;
    use rubia_core::InstallmentKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_client(db: &Database) -> String {
        db.clients()
            .insert(&NewClient {
                name: "Maria Silva".to_string(),
                tax_id: "12345678909".to_string(),
                phone: "5511999998888".to_string(),
                address: "".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_product(db: &Database, price_cents: i64, stock: i64) -> rubia_core::Product {
        db.products()
            .insert(&NewProduct {
                description: "Gold ring".to_string(),
                category: "rings".to_string(),
                price_cents,
                cost_cents: None,
                stock_quantity: stock,
                image_url: None,
            })
            .await
            .unwrap()
    }

    fn installment_terms(count: u32, down_cents: i64) -> Option<InstallmentTerms> {
        Some(InstallmentTerms {
            count,
            down_payment: Money::from_cents(down_cents),
        })
    }

    #[tokio::test]
    async fn test_cash_checkout_single_paid_installment() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 15000, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 2).unwrap();

        let sale = db
            .sales()
            .checkout(&client_id, &cart, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 30000);

        // Exactly one installment, already settled, amount = total.
        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].paid);
        assert_eq!(rows[0].amount_cents, 30000);
        assert_eq!(rows[0].note.as_deref(), Some("Paid in full - cash"));

        // Stock decremented.
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 3);

        // Items frozen.
        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description_snapshot, "Gold ring");
        assert_eq!(items[0].quantity, 2);
    }

    /// R$ 300.00, 3 installments, R$ 60.00 down payment.
    #[tokio::test]
    async fn test_installment_checkout_with_down_payment() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 30000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();

        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(3, 6000),
            )
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].kind, InstallmentKind::DownPayment);
        assert_eq!(rows[0].number, 0);
        assert_eq!(rows[0].amount_cents, 6000);
        assert!(rows[0].paid);

        let today = Utc::now().date_naive();
        for (i, row) in rows[1..].iter().enumerate() {
            assert_eq!(row.kind, InstallmentKind::Regular);
            assert_eq!(row.amount_cents, 8000);
            assert!(!row.paid);
            let expected_due = today.checked_add_months(Months::new(i as u32 + 1)).unwrap();
            assert_eq!(row.due_date, expected_due);
        }

        let summary = db.sales().summary(&sale.id).await.unwrap();
        assert_eq!(summary.total_paid.cents(), 6000);
        assert_eq!(summary.total_pending.cents(), 24000);
    }

    #[tokio::test]
    async fn test_single_installment_sale_left_unpaid() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();

        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(1, 0),
            )
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].paid);
        assert_eq!(rows[0].due_date, Utc::now().date_naive());
    }

    /// The stock check happens at commit time: a cart built against stale
    /// stock fails the whole checkout, leaving NO partial state behind.
    #[tokio::test]
    async fn test_checkout_oversell_rolls_everything_back() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 2).await;

        // Cart built while stock was 2...
        let mut cart = Cart::new();
        cart.add_item(&product, 2).unwrap();

        // ...but another sale drains it in the meantime.
        db.products().adjust_stock(&product.id, -1).await.unwrap();

        let err = db
            .sales()
            .checkout(&client_id, &cart, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        // No sale, no items, no installments, stock untouched.
        assert!(db.sales().list().await.unwrap().is_empty());
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 1);
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_installments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart_and_unknown_client() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 1).await;

        let empty = Cart::new();
        assert!(db
            .sales()
            .checkout(&client_id, &empty, PaymentMethod::Cash, None)
            .await
            .is_err());

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let err = db
            .sales()
            .checkout("ghost-client", &cart, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    /// Pending R$ 240.00, new down payment R$ 40.00, 2 new installments.
    #[tokio::test]
    async fn test_renegotiation_flow() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 30000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(3, 6000),
            )
            .await
            .unwrap();

        let created = db
            .sales()
            .renegotiate(&sale.id, Money::from_cents(4000), 2)
            .await
            .unwrap();
        assert_eq!(created.len(), 3);

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        // 4 original + 3 new, nothing deleted.
        assert_eq!(rows.len(), 7);

        let today = Utc::now().date_naive();
        let cancel_note = renegotiation_cancel_note(today);

        // The three original unpaid rows are cancelled: paid, noted, amounts
        // and due dates preserved.
        let cancelled: Vec<_> = rows
            .iter()
            .filter(|r| r.note.as_deref() == Some(cancel_note.as_str()))
            .collect();
        assert_eq!(cancelled.len(), 3);
        assert!(cancelled.iter().all(|r| r.paid && r.amount_cents == 8000));

        // New rows continue the numbering above the old maximum (0..3 → 4..6).
        let down = rows.iter().find(|r| r.kind == InstallmentKind::RenegotiationDownPayment);
        let down = down.expect("renegotiation down payment row");
        assert_eq!(down.number, 4);
        assert_eq!(down.amount_cents, 4000);
        assert!(down.paid);

        let renewed: Vec<_> = rows
            .iter()
            .filter(|r| r.kind == InstallmentKind::Renegotiated)
            .collect();
        assert_eq!(renewed.len(), 2);
        assert_eq!(renewed[0].number, 5);
        assert_eq!(renewed[1].number, 6);
        assert!(renewed.iter().all(|r| r.amount_cents == 10000 && !r.paid));

        // Still owed = pending at invocation minus the new down payment.
        let summary = db.sales().summary(&sale.id).await.unwrap();
        assert_eq!(summary.total_pending.cents(), 20000);
        // Paid + pending always covers every row ever written.
        let all: i64 = rows.iter().map(|r| r.amount_cents).sum();
        assert_eq!(summary.total_paid.cents() + summary.total_pending.cents(), all);
    }

    #[tokio::test]
    async fn test_renegotiation_rejection_mutates_nothing() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 30000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(3, 0),
            )
            .await
            .unwrap();

        let before = db.sales().get_installments(&sale.id).await.unwrap();

        // Down payment exceeds the R$ 300.00 pending balance.
        let err = db
            .sales()
            .renegotiate(&sale.id, Money::from_cents(30001), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let after = db.sales().get_installments(&sale.id).await.unwrap();
        assert_eq!(before.len(), after.len());
        assert!(after.iter().all(|r| !r.paid));
    }

    #[tokio::test]
    async fn test_repeated_renegotiation_touches_only_unpaid_rows() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 24000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(2, 0),
            )
            .await
            .unwrap();

        // First round: 240 pending → 2 rows of 120 become 3 rows of 80.
        db.sales()
            .renegotiate(&sale.id, Money::zero(), 3)
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        let first_round: Vec<String> = rows
            .iter()
            .filter(|r| r.kind == InstallmentKind::Renegotiated && r.paid)
            .map(|r| r.id.clone())
            .collect();
        assert!(first_round.is_empty());

        // Second round restructures only the three open rows; the cancelled
        // originals keep their first-round note.
        db.sales()
            .renegotiate(&sale.id, Money::zero(), 2)
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        assert_eq!(rows.len(), 2 + 3 + 2);
        let open: Vec<_> = rows.iter().filter(|r| !r.paid).collect();
        assert_eq!(open.len(), 2);
        assert_eq!(open.iter().map(|r| r.amount_cents).sum::<i64>(), 24000);
        // Numbering stayed monotonic: 1,2 then 3,4,5 then 6,7.
        assert_eq!(rows.last().unwrap().number, 7);

        // A sale with nothing pending cannot be renegotiated again.
        for row in open {
            db.sales().toggle_paid(&row.id).await.unwrap();
        }
        let err = db
            .sales()
            .renegotiate(&sale.id, Money::zero(), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NothingToRenegotiate(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_paid_tracks_last_transition() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(1, 0),
            )
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        let id = rows[0].id.clone();
        let today = Utc::now().date_naive();

        let paid = db.sales().toggle_paid(&id).await.unwrap();
        assert!(paid.paid);
        assert_eq!(paid.paid_at, Some(today));

        let unpaid = db.sales().toggle_paid(&id).await.unwrap();
        assert!(!unpaid.paid);
        assert_eq!(unpaid.paid_at, None);

        let paid_again = db.sales().toggle_paid(&id).await.unwrap();
        assert!(paid_again.paid);
        assert_eq!(paid_again.paid_at, Some(today));
    }

    /// The manual edit is an escape hatch: changing one amount does not
    /// rebalance siblings, so the schedule can stop summing to the sale
    /// total. Accepted behavior - this test documents it.
    #[tokio::test]
    async fn test_manual_edit_can_desync_sale_total() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 30000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(3, 0),
            )
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        let edited = db
            .sales()
            .update_installment(&rows[0].id, Money::from_cents(5000), rows[0].due_date, false)
            .await
            .unwrap();
        assert_eq!(edited.amount_cents, 5000);

        let summary = db.sales().summary(&sale.id).await.unwrap();
        let ledger_total = summary.total_paid + summary.total_pending;
        assert_ne!(ledger_total.cents(), sale.total_cents);
    }

    #[tokio::test]
    async fn test_manual_edit_sets_and_clears_payment_date() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(1, 0),
            )
            .await
            .unwrap();

        let rows = db.sales().get_installments(&sale.id).await.unwrap();
        let row = &rows[0];

        let paid = db
            .sales()
            .update_installment(&row.id, row.amount(), row.due_date, true)
            .await
            .unwrap();
        assert_eq!(paid.paid_at, Some(Utc::now().date_naive()));

        let cleared = db
            .sales()
            .update_installment(&row.id, row.amount(), row.due_date, false)
            .await
            .unwrap();
        assert_eq!(cleared.paid_at, None);
    }

    #[tokio::test]
    async fn test_delete_sale_cascades() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 2).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let sale = db
            .sales()
            .checkout(
                &client_id,
                &cart,
                PaymentMethod::Installment,
                installment_terms(2, 0),
            )
            .await
            .unwrap();

        db.sales().delete(&sale.id).await.unwrap();

        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
        assert!(db.sales().get_items(&sale.id).await.unwrap().is_empty());
        assert!(db.sales().get_installments(&sale.id).await.unwrap().is_empty());

        // The client survives the cascade and can be removed afterwards.
        db.clients().delete(&client_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_client_delete_blocked_while_sale_exists() {
        let db = test_db().await;
        let client_id = seed_client(&db).await;
        let product = seed_product(&db, 10000, 1).await;

        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        db.sales()
            .checkout(&client_id, &cart, PaymentMethod::Pix, None)
            .await
            .unwrap();

        let err = db.clients().delete(&client_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
