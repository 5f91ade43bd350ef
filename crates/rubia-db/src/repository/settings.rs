//! # Notification Settings Repository
//!
//! The singleton-per-store configuration record for the WhatsApp reminder
//! dispatcher. The look-ahead day set is stored as a JSON array in a TEXT
//! column and decoded on read.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rubia_core::validation::validate_phone;
use rubia_core::{CoreError, NotificationSettings};

/// Raw row shape; `lead_days` is JSON text until decoded.
#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    id: String,
    whatsapp_phone: String,
    api_key: String,
    send_time: String,
    lead_days: String,
    active: bool,
    send_on_weekends: bool,
    updated_at: chrono::DateTime<Utc>,
}

impl SettingsRow {
    fn into_settings(self) -> DbResult<NotificationSettings> {
        let lead_days: Vec<i64> = serde_json::from_str(&self.lead_days)
            .map_err(|e| DbError::Internal(format!("corrupt lead_days column: {}", e)))?;

        Ok(NotificationSettings {
            id: self.id,
            whatsapp_phone: self.whatsapp_phone,
            api_key: self.api_key,
            send_time: self.send_time,
            lead_days,
            active: self.active,
            send_on_weekends: self.send_on_weekends,
            updated_at: self.updated_at,
        })
    }
}

/// Input for saving notification settings.
#[derive(Debug, Clone)]
pub struct SettingsUpdate {
    pub whatsapp_phone: String,
    pub api_key: String,
    /// Daily send time, "HH:MM" (the external scheduler honors this).
    pub send_time: String,
    pub lead_days: Vec<i64>,
    pub active: bool,
    pub send_on_weekends: bool,
}

/// Repository for the notification settings singleton.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the settings record, if one was ever saved.
    pub async fn get(&self) -> DbResult<Option<NotificationSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT id, whatsapp_phone, api_key, send_time, lead_days,
                   active, send_on_weekends, updated_at
            FROM notification_settings
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SettingsRow::into_settings).transpose()
    }

    /// Gets the settings only when reminders are switched on.
    ///
    /// The dispatcher's entry point: `None` means "nothing to do today".
    pub async fn get_active(&self) -> DbResult<Option<NotificationSettings>> {
        Ok(self.get().await?.filter(|s| s.active))
    }

    /// Creates or overwrites the singleton record.
    pub async fn save(&self, update: &SettingsUpdate) -> DbResult<NotificationSettings> {
        validate_phone(&update.whatsapp_phone).map_err(CoreError::from)?;
        if update.api_key.trim().is_empty() {
            return Err(CoreError::from(rubia_core::ValidationError::Required {
                field: "api_key".to_string(),
            })
            .into());
        }

        let mut lead_days = update.lead_days.clone();
        lead_days.sort_unstable_by(|a, b| b.cmp(a));
        lead_days.dedup();
        let lead_days_json = serde_json::to_string(&lead_days)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let now = Utc::now();

        debug!(active = update.active, "Saving notification settings");

        let existing_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM notification_settings LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        let id = match existing_id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE notification_settings
                    SET whatsapp_phone = ?2, api_key = ?3, send_time = ?4,
                        lead_days = ?5, active = ?6, send_on_weekends = ?7,
                        updated_at = ?8
                    WHERE id = ?1
                    "#,
                )
                .bind(&id)
                .bind(update.whatsapp_phone.trim())
                .bind(update.api_key.trim())
                .bind(update.send_time.trim())
                .bind(&lead_days_json)
                .bind(update.active)
                .bind(update.send_on_weekends)
                .bind(now)
                .execute(&self.pool)
                .await?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"
                    INSERT INTO notification_settings
                        (id, whatsapp_phone, api_key, send_time, lead_days,
                         active, send_on_weekends, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(&id)
                .bind(update.whatsapp_phone.trim())
                .bind(update.api_key.trim())
                .bind(update.send_time.trim())
                .bind(&lead_days_json)
                .bind(update.active)
                .bind(update.send_on_weekends)
                .bind(now)
                .execute(&self.pool)
                .await?;
                id
            }
        };

        self.get()
            .await?
            .filter(|s| s.id == id)
            .ok_or_else(|| DbError::not_found("NotificationSettings", id))
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

    fn update(active: bool) -> SettingsUpdate {
        SettingsUpdate {
            whatsapp_phone: "5511999998888".to_string(),
            api_key: "secret-key".to_string(),
            send_time: "10:00".to_string(),
            lead_days: vec![0, 3, 2, 3],
            active,
            send_on_weekends: false,
        }
    }

    #[tokio::test]
    async fn test_save_is_singleton_upsert() {
        let db = test_db().await;

        let first = db.settings().save(&update(false)).await.unwrap();
        // Lead days come back sorted descending and deduplicated.
        assert_eq!(first.lead_days, vec![3, 2, 0]);

        let mut changed = update(true);
        changed.send_time = "09:30".to_string();
        let second = db.settings().save(&changed).await.unwrap();

        // Still one record, same identity.
        assert_eq!(first.id, second.id);
        assert_eq!(second.send_time, "09:30");
        assert!(second.active);
    }

    #[tokio::test]
    async fn test_get_active_filters_switched_off() {
        let db = test_db().await;

        assert!(db.settings().get_active().await.unwrap().is_none());

        db.settings().save(&update(false)).await.unwrap();
        assert!(db.settings().get_active().await.unwrap().is_none());

        db.settings().save(&update(true)).await.unwrap();
        assert!(db.settings().get_active().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_rejects_bad_phone_or_key() {
        let db = test_db().await;

        let mut bad_phone = update(true);
        bad_phone.whatsapp_phone = "+55 11 9999".to_string();
        assert!(db.settings().save(&bad_phone).await.is_err());

        let mut bad_key = update(true);
        bad_key.api_key = "  ".to_string();
        assert!(db.settings().save(&bad_key).await.is_err());
    }
}
