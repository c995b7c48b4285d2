use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

use crate::core::config::Settings;
use crate::core::metrics;

/// Body posted to the webhook when a candidate finishes in time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct ResultNotification {
    pub(crate) result_id: i64,
    pub(crate) user_id: String,
    pub(crate) username: String,
    pub(crate) email: Option<String>,
    pub(crate) score: usize,
    pub(crate) total: usize,
    pub(crate) elapsed_seconds: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ResultNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl ResultNotifier {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let notifications = settings.notifications();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(notifications.timeout_seconds))
            .build()
            .context("Failed to build notification HTTP client")?;

        let webhook_url = notifications.enabled().then(|| notifications.webhook_url.clone());
        Ok(Self { client, webhook_url })
    }

    pub(crate) fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Fire-and-forget delivery. Failures are logged and counted, never returned.
    pub(crate) fn dispatch(&self, notification: ResultNotification) {
        if !self.enabled() {
            return;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            let result_id = notification.result_id;
            match notifier.deliver(&notification).await {
                Ok(()) => {
                    metrics::record_notification(true);
                    tracing::info!(result_id, "Result notification delivered");
                }
                Err(err) => {
                    metrics::record_notification(false);
                    tracing::warn!(result_id, error = %err, "Result notification failed");
                }
            }
        });
    }

    async fn deliver(&self, notification: &ResultNotification) -> Result<()> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Ok(());
        };

        self.client
            .post(url)
            .json(notification)
            .send()
            .await
            .context("Webhook request failed")?
            .error_for_status()
            .context("Webhook returned an error status")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_expected_fields() {
        let value = serde_json::to_value(ResultNotification {
            result_id: 7,
            user_id: "u-1".into(),
            username: "candidate".into(),
            email: None,
            score: 3,
            total: 4,
            elapsed_seconds: Some(600),
        })
        .expect("json");

        assert_eq!(
            value,
            serde_json::json!({
                "result_id": 7,
                "user_id": "u-1",
                "username": "candidate",
                "email": null,
                "score": 3,
                "total": 4,
                "elapsed_seconds": 600,
            })
        );
    }

    #[tokio::test]
    async fn disabled_notifier_skips_delivery() {
        let notifier = ResultNotifier { client: Client::new(), webhook_url: None };
        assert!(!notifier.enabled());
        notifier
            .deliver(&ResultNotification {
                result_id: 1,
                user_id: "u".into(),
                username: "u".into(),
                email: None,
                score: 0,
                total: 0,
                elapsed_seconds: None,
            })
            .await
            .expect("no-op");
    }
}
