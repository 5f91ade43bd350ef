//! # Client Repository
//!
//! Database operations for clients. Plain reference entity: create, list,
//! delete. The unique tax id surfaces duplicates as a conflict; deletion is
//! blocked while any sale references the client.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rubia_core::validation::{validate_name, validate_tax_id};
use rubia_core::Client;

/// Input for registering a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub tax_id: String,
    pub phone: String,
    pub address: String,
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Registers a new client.
    ///
    /// ## Errors
    /// * Validation failure on name or tax id (before any write)
    /// * `DbError::UniqueViolation` when the tax id is already registered
    pub async fn insert(&self, new: &NewClient) -> DbResult<Client> {
        validate_name("name", &new.name).map_err(rubia_core::CoreError::from)?;
        let tax_id = validate_tax_id(&new.tax_id).map_err(rubia_core::CoreError::from)?;

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            tax_id,
            phone: new.phone.trim().to_string(),
            address: new.address.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, tax_id, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, tax_id, phone, address, created_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Lists all clients ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, tax_id, phone, address, created_at
            FROM clients
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Deletes a client.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` when the client is referenced by a
    ///   sale - the operation aborts with no partial state
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }

    /// Counts registered clients (for dashboard metrics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
