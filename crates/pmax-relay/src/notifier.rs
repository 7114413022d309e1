//! Webhook delivery for review reports and alerts.

use pmax_engine::{Alert, Severity};
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::RelayError;
use crate::render::render_alert;
use crate::retry::retry_with_backoff;
use crate::{build_client, check_status, parse_url, RelayConfig};

/// One message for the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl Notification {
    #[must_use]
    pub fn report(text: String) -> Self {
        Self {
            text,
            severity: None,
        }
    }

    #[must_use]
    pub fn alert(alert: &Alert) -> Self {
        Self {
            text: render_alert(alert),
            severity: Some(alert.severity),
        }
    }
}

pub struct WebhookNotifier {
    client: Client,
    url: Url,
    config: RelayConfig,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidUrl`] for a malformed webhook URL, or
    /// [`RelayError::Http`] if the HTTP client cannot be built.
    pub fn new(url: &str, config: RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: parse_url(url)?,
            config,
        })
    }

    async fn post_once(&self, notification: &Notification) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await?;
        // The webhook's host is not logged; the URL usually embeds a token.
        check_status("notify-webhook", response).await?;
        Ok(())
    }

    /// Deliver one notification, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last [`RelayError`] once retries are exhausted.
    pub async fn send(&self, notification: &Notification) -> Result<(), RelayError> {
        retry_with_backoff(
            "notify-webhook",
            self.config.max_retries,
            self.config.backoff_base_ms,
            || self.post_once(notification),
        )
        .await?;
        tracing::info!(
            severity = ?notification.severity,
            chars = notification.text.len(),
            "notification delivered"
        );
        Ok(())
    }

    /// Deliver every alert, one message each. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`RelayError`] encountered.
    pub async fn send_alerts(&self, alerts: &[Alert]) -> Result<(), RelayError> {
        for alert in alerts {
            self.send(&Notification::alert(alert)).await?;
        }
        Ok(())
    }
}
