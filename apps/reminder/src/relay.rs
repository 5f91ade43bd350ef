//! CallMeBot WhatsApp relay client.
//!
//! The relay contract is a single GET:
//! `https://api.callmebot.com/whatsapp.php?phone=<digits>&text=<message>&apikey=<key>`
//! Success is exactly HTTP 200; anything else is a hard failure surfaced to
//! the operator/log - there is no retry here.

use std::time::Duration;

use tracing::{debug, info};

const CALLMEBOT_URL: &str = "https://api.callmebot.com/whatsapp.php";

/// Relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request never completed (DNS, TLS, timeout).
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-200 status.
    #[error("relay rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Thin client over the CallMeBot endpoint.
#[derive(Debug, Clone)]
pub struct WhatsAppRelay {
    http: reqwest::Client,
    base_url: String,
}

impl WhatsAppRelay {
    /// Creates a relay client against the production endpoint.
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(WhatsAppRelay {
            http,
            base_url: CALLMEBOT_URL.to_string(),
        })
    }

    /// Overrides the endpoint (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends one WhatsApp message.
    ///
    /// `phone` is E.164 digits without the leading '+'. The query-string
    /// encoding of `text` is handled by the HTTP client.
    pub async fn send(&self, phone: &str, api_key: &str, text: &str) -> Result<(), RelayError> {
        debug!(phone = %phone, chars = text.len(), "Sending WhatsApp reminder");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("phone", phone), ("text", text), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(phone = %phone, "Reminder delivered");
        Ok(())
    }
}
