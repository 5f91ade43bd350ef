//! # Report Repository
//!
//! Read-only aggregation over the ledger and sales data: the dashboard
//! numbers and the reminder dispatcher's due-installment feed. No mutation
//! logic lives here; every figure is recomputed from the rows at query time.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use rubia_core::{Money, Product, Sale};

/// One unpaid receivable installment joined with its client, as needed by
/// the reminder message.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DueReceivable {
    pub installment_id: String,
    pub sale_id: String,
    pub client_name: String,
    pub number: i64,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
}

impl DueReceivable {
    /// Returns the installment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A product ranked by total quantity sold.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: String,
    pub description_snapshot: String,
    pub total_quantity: i64,
}

/// Repository for read-only reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Total sales revenue since a point in time (today / this month cards).
    pub async fn revenue_since(&self, since: DateTime<Utc>) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM sales WHERE sold_at >= ?1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Total sales revenue inside a half-open interval (monthly series).
    pub async fn revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM sales WHERE sold_at >= ?1 AND sold_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Open receivables: sum of unpaid sale installments.
    pub async fn pending_receivables_total(&self) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM sale_installments WHERE paid = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Open payables: sum of unpaid payable installments.
    pub async fn pending_payables_total(&self) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payable_installments WHERE paid = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Most recent sales for the dashboard feed.
    pub async fn recent_sales(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, sold_at, total_cents, payment_method, created_at
            FROM sales
            ORDER BY sold_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Products running low (stock at or below the threshold).
    pub async fn low_stock_products(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            WHERE stock_quantity <= ?1
            ORDER BY stock_quantity, description
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Best sellers by total quantity across all sales.
    pub async fn top_selling_products(&self, limit: i64) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT product_id, description_snapshot, SUM(quantity) AS total_quantity
            FROM sale_items
            GROUP BY product_id, description_snapshot
            ORDER BY total_quantity DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Unpaid receivable installments due on any of the given dates, joined
    /// with client names - the reminder dispatcher's read contract. Ordered
    /// by due date, then client name.
    pub async fn due_receivables_on(&self, dates: &[NaiveDate]) -> DbResult<Vec<DueReceivable>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; dates.len()].join(", ");
        let sql = format!(
            r#"
            SELECT i.id AS installment_id,
                   i.sale_id,
                   c.name AS client_name,
                   i.number,
                   i.amount_cents,
                   i.due_date
            FROM sale_installments i
            JOIN sales s ON s.id = i.sale_id
            JOIN clients c ON c.id = s.client_id
            WHERE i.paid = 0 AND i.due_date IN ({})
            ORDER BY i.due_date, c.name
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, DueReceivable>(&sql);
        for date in dates {
            query = query.bind(*date);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
