//! Outbound messaging for monitor status and heartbeat texts
//!
//! The monitor only ever hands plain text to a [`Messenger`]. Delivery mode,
//! formatting target and recipient are the messenger's business.

pub mod discord;
pub mod memory;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Notify;

pub use discord::DiscordMessenger;
pub use memory::MemoryMessenger;
pub use webhook::WebhookMessenger;

/// Delivers a text message to the chat side
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// Messenger used when no notifier is configured: texts only go to the log
#[derive(Debug, Clone, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        info!("{text}");
        Ok(())
    }
}

/// Pick the messenger for the configured notifier
pub fn build_messenger(notify: Option<&Notify>) -> Arc<dyn Messenger> {
    match notify {
        Some(Notify::Discord(discord)) => Arc::new(DiscordMessenger::new(discord.clone())),
        Some(Notify::Webhook(webhook)) => Arc::new(WebhookMessenger::new(webhook.clone())),
        None => Arc::new(LogMessenger),
    }
}
