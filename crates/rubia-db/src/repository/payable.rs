//! # Payable Repository
//!
//! Supplier invoices and their fixed monthly schedules - the mirror of the
//! receivable ledger, without down payments or renegotiation.
//!
//! Registering a payable can also stock the products that arrived with the
//! invoice: each gets a fresh QR code, a suggested sale price of 2× its unit
//! cost, and a provenance link back to the payable. Invoice, schedule and
//! products are written in one transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::generate_product_code;
use rubia_core::schedule::payable_schedule;
use rubia_core::validation::{validate_name, validate_quantity};
use rubia_core::{CoreError, Money, Payable, PayableInstallment, PaymentMethod};

const PAYABLE_COLUMNS: &str =
    "id, supplier_id, description, total_cents, installment_count, invoice_number, payment_method, created_at";

/// Input for registering a payable.
#[derive(Debug, Clone)]
pub struct NewPayable {
    pub supplier_id: String,
    pub description: String,
    pub total_cents: i64,
    pub installment_count: u32,
    pub invoice_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// A product line arriving with a supplier invoice.
#[derive(Debug, Clone)]
pub struct IncomingProduct {
    pub description: String,
    pub category: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Repository for payable database operations.
#[derive(Debug, Clone)]
pub struct PayableRepository {
    pool: SqlitePool,
}

impl PayableRepository {
    /// Creates a new PayableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PayableRepository { pool }
    }

    /// Registers a supplier invoice, its installment schedule, and any
    /// products it stocked - one transaction.
    pub async fn create(
        &self,
        new: &NewPayable,
        products: &[IncomingProduct],
    ) -> DbResult<Payable> {
        validate_name("description", &new.description).map_err(CoreError::from)?;
        for item in products {
            validate_name("description", &item.description).map_err(CoreError::from)?;
            validate_quantity(item.quantity).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let today = now.date_naive();
        let total = Money::from_cents(new.total_cents);

        // Full schedule derived and validated before the first write.
        let plan = payable_schedule(total, new.installment_count, today)?;

        let payable = Payable {
            id: Uuid::new_v4().to_string(),
            supplier_id: new.supplier_id.clone(),
            description: new.description.trim().to_string(),
            total_cents: new.total_cents,
            installment_count: new.installment_count as i64,
            invoice_number: new.invoice_number.clone(),
            payment_method: new.payment_method,
            created_at: now,
        };

        debug!(id = %payable.id, total = %total, "Registering payable");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payables
                (id, supplier_id, description, total_cents, installment_count,
                 invoice_number, payment_method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payable.id)
        .bind(&payable.supplier_id)
        .bind(&payable.description)
        .bind(payable.total_cents)
        .bind(payable.installment_count)
        .bind(&payable.invoice_number)
        .bind(payable.payment_method)
        .bind(payable.created_at)
        .execute(&mut *tx)
        .await?;

        for row in &plan {
            sqlx::query(
                r#"
                INSERT INTO payable_installments
                    (id, payable_id, number, amount_cents, due_date, paid)
                VALUES (?1, ?2, ?3, ?4, ?5, 0)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&payable.id)
            .bind(row.number)
            .bind(row.amount.cents())
            .bind(row.due_date)
            .execute(&mut *tx)
            .await?;
        }

        for item in products {
            // Suggested sale price: 2× the recorded unit cost.
            sqlx::query(
                r#"
                INSERT INTO products (
                    id, code, description, category,
                    price_cents, cost_cents, stock_quantity,
                    image_url, payable_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?9, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(generate_product_code())
            .bind(item.description.trim())
            .bind(item.category.trim())
            .bind(item.unit_cost_cents * 2)
            .bind(item.unit_cost_cents)
            .bind(item.quantity)
            .bind(&payable.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %payable.id,
            installments = plan.len(),
            stocked_products = products.len(),
            "Payable registered"
        );

        Ok(payable)
    }

    /// Gets a payable by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payable>> {
        let payable = sqlx::query_as::<_, Payable>(&format!(
            "SELECT {} FROM payables WHERE id = ?1",
            PAYABLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payable)
    }

    /// Lists payables newest first.
    pub async fn list(&self) -> DbResult<Vec<Payable>> {
        let payables = sqlx::query_as::<_, Payable>(&format!(
            "SELECT {} FROM payables ORDER BY created_at DESC",
            PAYABLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(payables)
    }

    /// Gets a payable's installments ordered by number.
    pub async fn get_installments(&self, payable_id: &str) -> DbResult<Vec<PayableInstallment>> {
        let rows = sqlx::query_as::<_, PayableInstallment>(
            r#"
            SELECT id, payable_id, number, amount_cents, due_date, paid
            FROM payable_installments
            WHERE payable_id = ?1
            ORDER BY number
            "#,
        )
        .bind(payable_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Flips one payable installment between paid and unpaid.
    pub async fn toggle_paid(&self, installment_id: &str) -> DbResult<PayableInstallment> {
        let result = sqlx::query(
            "UPDATE payable_installments SET paid = NOT paid WHERE id = ?1",
        )
        .bind(installment_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payable installment", installment_id));
        }

        self.get_installment(installment_id).await
    }

    /// Manual edit of one payable installment's amount and due date.
    pub async fn update_installment(
        &self,
        installment_id: &str,
        amount: Money,
        due_date: chrono::NaiveDate,
    ) -> DbResult<PayableInstallment> {
        rubia_core::validation::validate_price_cents(amount.cents()).map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE payable_installments SET amount_cents = ?2, due_date = ?3 WHERE id = ?1",
        )
        .bind(installment_id)
        .bind(amount.cents())
        .bind(due_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payable installment", installment_id));
        }

        self.get_installment(installment_id).await
    }

    /// Deletes a payable; its installments cascade with it. Products stocked
    /// by the invoice stay, losing only their provenance link.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payable");

        let result = sqlx::query("DELETE FROM payables WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payable", id));
        }

        Ok(())
    }

    async fn get_installment(&self, id: &str) -> DbResult<PayableInstallment> {
        sqlx::query_as::<_, PayableInstallment>(
            r#"
            SELECT id, payable_id, number, amount_cents, due_date, paid
            FROM payable_installments
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Payable installment", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::supplier::NewSupplier;
    use chrono::Months;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_supplier(db: &Database) -> String {
        db.suppliers()
            .find_or_create(&NewSupplier {
                name: "Atacado Ouro Fino".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    fn invoice(supplier_id: &str, total_cents: i64, count: u32) -> NewPayable {
        NewPayable {
            supplier_id: supplier_id.to_string(),
            description: "January restock".to_string(),
            total_cents,
            installment_count: count,
            invoice_number: Some("NF-1042".to_string()),
            payment_method: Some(PaymentMethod::Pix),
        }
    }

    #[tokio::test]
    async fn test_create_generates_monthly_schedule() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let payable = db
            .payables()
            .create(&invoice(&supplier_id, 100000, 4), &[])
            .await
            .unwrap();

        let rows = db.payables().get_installments(&payable.id).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| !r.paid && r.amount_cents == 25000));

        let today = Utc::now().date_naive();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.number, i as i64 + 1);
            let expected = today.checked_add_months(Months::new(i as u32 + 1)).unwrap();
            assert_eq!(row.due_date, expected);
        }
    }

    #[tokio::test]
    async fn test_create_stocks_products_with_provenance() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let arriving = vec![
            IncomingProduct {
                description: "Silver bracelet".to_string(),
                category: "bracelets".to_string(),
                quantity: 5,
                unit_cost_cents: 4000,
            },
            IncomingProduct {
                description: "Pearl earrings".to_string(),
                category: "earrings".to_string(),
                quantity: 2,
                unit_cost_cents: 9000,
            },
        ];

        let payable = db
            .payables()
            .create(&invoice(&supplier_id, 38000, 2), &arriving)
            .await
            .unwrap();

        let stocked = db.products().list_by_payable(&payable.id).await.unwrap();
        assert_eq!(stocked.len(), 2);

        let bracelet = stocked
            .iter()
            .find(|p| p.description == "Silver bracelet")
            .unwrap();
        assert_eq!(bracelet.stock_quantity, 5);
        assert_eq!(bracelet.cost_cents, Some(4000));
        // Suggested sale price: 2× cost.
        assert_eq!(bracelet.price_cents, 8000);
        assert_eq!(bracelet.payable_id.as_deref(), Some(payable.id.as_str()));
        assert_eq!(bracelet.code.len(), 8);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_without_writes() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        // Zero installments.
        assert!(db
            .payables()
            .create(&invoice(&supplier_id, 10000, 0), &[])
            .await
            .is_err());

        // Non-positive total.
        assert!(db
            .payables()
            .create(&invoice(&supplier_id, 0, 2), &[])
            .await
            .is_err());

        // Bad product line aborts the whole registration.
        let bad_product = vec![IncomingProduct {
            description: "".to_string(),
            category: "rings".to_string(),
            quantity: 1,
            unit_cost_cents: 100,
        }];
        assert!(db
            .payables()
            .create(&invoice(&supplier_id, 10000, 2), &bad_product)
            .await
            .is_err());

        assert!(db.payables().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_and_edit_installment() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let payable = db
            .payables()
            .create(&invoice(&supplier_id, 10000, 2), &[])
            .await
            .unwrap();

        let rows = db.payables().get_installments(&payable.id).await.unwrap();

        let paid = db.payables().toggle_paid(&rows[0].id).await.unwrap();
        assert!(paid.paid);
        let unpaid = db.payables().toggle_paid(&rows[0].id).await.unwrap();
        assert!(!unpaid.paid);

        let new_due = rows[1].due_date.checked_add_months(Months::new(1)).unwrap();
        let edited = db
            .payables()
            .update_installment(&rows[1].id, Money::from_cents(6000), new_due)
            .await
            .unwrap();
        assert_eq!(edited.amount_cents, 6000);
        assert_eq!(edited.due_date, new_due);
    }

    #[tokio::test]
    async fn test_delete_cascades_installments_keeps_products() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let arriving = vec![IncomingProduct {
            description: "Silver bracelet".to_string(),
            category: "bracelets".to_string(),
            quantity: 1,
            unit_cost_cents: 4000,
        }];
        let payable = db
            .payables()
            .create(&invoice(&supplier_id, 4000, 2), &arriving)
            .await
            .unwrap();

        db.payables().delete(&payable.id).await.unwrap();

        assert!(db.payables().get_by_id(&payable.id).await.unwrap().is_none());
        assert!(db
            .payables()
            .get_installments(&payable.id)
            .await
            .unwrap()
            .is_empty());

        // The stocked product survives, with its provenance link cleared.
        let products = db.products().list_all().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].payable_id, None);
    }
}
