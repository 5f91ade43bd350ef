//! # Product Repository
//!
//! Database operations for inventory.
//!
//! ## Key Operations
//! - CRUD with the dual-key pattern (UUID id + 8-digit QR code)
//! - Guarded stock adjustments (stock never goes negative)
//! - QR payload lookup for the checkout scanner
//! - Provenance lookup: which products a supplier invoice stocked

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rubia_core::validation::{validate_name, validate_price_cents, validate_product_code};
use rubia_core::{CoreError, Product};

/// Input for registering a product by hand (inventory page).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Registers a new product with a freshly generated QR code.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_name("description", &new.description).map_err(CoreError::from)?;
        validate_price_cents(new.price_cents).map_err(CoreError::from)?;
        if new.stock_quantity < 0 {
            return Err(CoreError::from(rubia_core::ValidationError::OutOfRange {
                field: "stock_quantity".to_string(),
                min: 0,
                max: i64::MAX,
            })
            .into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: generate_product_code(),
            description: new.description.trim().to_string(),
            category: new.category.trim().to_string(),
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            stock_quantity: new.stock_quantity,
            image_url: new.image_url.clone(),
            payable_id: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, description, category,
                price_cents, cost_cents, stock_quantity,
                image_url, payable_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_quantity)
        .bind(&product.image_url)
        .bind(&product.payable_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves an 8-digit QR payload to a product.
    ///
    /// Used by the checkout scanner and the typed-code search box.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        validate_product_code(code).map_err(CoreError::from)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products with stock available, ordered by description.
    ///
    /// This is the checkout grid: sold-out products are hidden.
    pub async fn list_in_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            WHERE stock_quantity > 0
            ORDER BY description
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists every product, ordered by description (inventory page).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            ORDER BY description
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists the products stocked by a supplier invoice (provenance view).
    pub async fn list_by_payable(&self, payable_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, description, category,
                   price_cents, cost_cents, stock_quantity,
                   image_url, payable_id, created_at, updated_at
            FROM products
            WHERE payable_id = ?1
            ORDER BY description
            "#,
        )
        .bind(payable_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's editable fields (not the code, not provenance).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_name("description", &product.description).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                description = ?2,
                category = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                image_url = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(&product.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts stock by a delta (positive = manual stock add, negative =
    /// correction). The guard keeps stock from going below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock_quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either the product is missing or the delta would go negative;
            // distinguish for the operator.
            let current = self.get_by_id(id).await?;
            return match current {
                None => Err(DbError::not_found("Product", id)),
                Some(p) => Err(CoreError::InsufficientStock {
                    code: p.code,
                    available: p.stock_quantity,
                    requested: -delta,
                }
                .into()),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` when the product was already sold -
    ///   sale history wins, the operation aborts with no partial state
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for dashboard metrics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates an 8-digit numeric product code (the QR payload).
///
/// Collisions are possible in principle; the UNIQUE index on `code` turns
/// one into a conflict the operator can retry.
pub fn generate_product_code() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    rng.random_range(10_000_000u32..100_000_000).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
