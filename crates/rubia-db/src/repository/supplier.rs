//! # Supplier Repository
//!
//! Mirror of the client repository on the payable side, plus the
//! find-or-create-by-name shortcut used by payable registration (the
//! operator types a supplier name and the row appears on first use).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rubia_core::validation::validate_name;
use rubia_core::Supplier;

/// Input for registering a supplier.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub tax_id: String,
    pub phone: String,
    pub address: String,
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Registers a new supplier.
    pub async fn insert(&self, new: &NewSupplier) -> DbResult<Supplier> {
        validate_name("name", &new.name).map_err(rubia_core::CoreError::from)?;

        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            tax_id: new.tax_id.trim().to_string(),
            phone: new.phone.trim().to_string(),
            address: new.address.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %supplier.id, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, tax_id, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.tax_id)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Gets a supplier by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, tax_id, phone, address, created_at
            FROM suppliers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Finds a supplier by exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, tax_id, phone, address, created_at
            FROM suppliers
            WHERE name = ?1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Returns the supplier with this name, creating it on first use.
    pub async fn find_or_create(&self, new: &NewSupplier) -> DbResult<Supplier> {
        if let Some(existing) = self.find_by_name(&new.name).await? {
            return Ok(existing);
        }
        self.insert(new).await
    }

    /// Lists all suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, tax_id, phone, address, created_at
            FROM suppliers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Deletes a supplier; blocked while a payable references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = test_db().await;
        let new = NewSupplier {
            name: "Atacado Ouro Fino".to_string(),
            ..Default::default()
        };

        let first = db.suppliers().find_or_create(&new).await.unwrap();
        let second = db.suppliers().find_or_create(&new).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.suppliers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_name() {
        let db = test_db().await;
        let new = NewSupplier {
            name: "".to_string(),
            ..Default::default()
        };
        assert!(db.suppliers().insert(&new).await.is_err());
    }
}
