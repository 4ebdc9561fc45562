use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{instrument, trace};

use crate::config::Webhook;

use super::Messenger;

/// Posts texts as `{ "text": ..., "timestamp": ... }` to a generic webhook
#[derive(Debug, Clone)]
pub struct WebhookMessenger {
    client: Client,
    webhook: Webhook,
}

impl WebhookMessenger {
    pub fn new(webhook: Webhook) -> Self {
        Self {
            client: Client::new(),
            webhook,
        }
    }
}

#[async_trait]
impl Messenger for WebhookMessenger {
    #[instrument(skip_all, fields(url = %self.webhook.url))]
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let payload = json!({
            "text": text,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(&self.webhook.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send webhook message")?;

        if !response.status().is_success() {
            bail!("webhook failed with status: {}", response.status());
        }

        trace!("sent webhook message");
        Ok(())
    }
}
