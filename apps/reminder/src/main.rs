//! # Rubia Reminder Dispatcher
//!
//! Daily job that reads the receivable ledger and sends one WhatsApp digest
//! of installments coming due, via CallMeBot.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  external scheduler (cron, at the configured send time)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load settings ── inactive? ───────────► exit quietly                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  weekend? ── sending disabled on weekends? ──► exit quietly             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  today + each configured look-ahead offset → due-date set               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  unpaid installments due on those dates (joined with clients)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  format one digest ──► CallMeBot GET ──► 200 or hard failure            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read-only against the ledger; re-running at worst repeats a reminder.

mod config;
mod message;
mod relay;

use std::time::Duration;

use chrono::{Datelike, Duration as ChronoDuration, Local, Weekday};
use tracing::info;

use crate::config::ReminderConfig;
use crate::message::{format_digest, group_by_days_until_due};
use crate::relay::WhatsAppRelay;
use rubia_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting reminder dispatcher");

    let config = ReminderConfig::load()?;
    info!(db = %config.database_path.display(), "Configuration loaded");

    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let Some(settings) = db.settings().get_active().await? else {
        info!("Reminders not configured or switched off, nothing to do");
        return Ok(());
    };

    let today = Local::now().date_naive();

    let weekend = matches!(today.weekday(), Weekday::Sat | Weekday::Sun);
    if weekend && !settings.send_on_weekends {
        info!("Weekend sending is disabled, nothing to do");
        return Ok(());
    }

    let alert_dates: Vec<_> = settings
        .lead_days
        .iter()
        .map(|days| today + ChronoDuration::days(*days))
        .collect();

    let due = db.reports().due_receivables_on(&alert_dates).await?;
    if due.is_empty() {
        info!("No installments due inside the look-ahead windows");
        return Ok(());
    }

    info!(count = due.len(), "Installments coming due");

    let groups = group_by_days_until_due(due, today);
    let Some(digest) = format_digest(&groups, today) else {
        return Ok(());
    };

    let relay = WhatsAppRelay::new(Duration::from_secs(config.relay_timeout_secs))?;
    relay
        .send(&settings.whatsapp_phone, &settings.api_key, &digest)
        .await?;

    info!("Reminder digest sent");
    Ok(())
}
