use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, instrument, trace};

use crate::config::Discord;

use super::Messenger;

/// Discord rejects message content longer than this many characters
const CONTENT_LIMIT: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub content: String,
}

pub struct MessageBuilder {
    mention: Option<String>,
    content: String,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            mention: None,
            content: String::new(),
        }
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn mention(mut self, user_id: &str) -> Self {
        self.mention = Some(format!("<@{user_id}>"));
        self
    }

    pub fn build(self) -> Message {
        let content = match self.mention {
            Some(mention) => format!("{mention} {}", self.content),
            None => self.content,
        };

        Message {
            content: truncate(content, CONTENT_LIMIT),
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(content: String, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content;
    }
    let mut truncated: String = content.chars().take(limit - 1).collect();
    truncated.push('…');
    truncated
}

/// Posts texts to a Discord webhook
#[derive(Debug, Clone)]
pub struct DiscordMessenger {
    client: Client,
    discord: Discord,
}

impl DiscordMessenger {
    pub fn new(discord: Discord) -> Self {
        Self {
            client: Client::new(),
            discord,
        }
    }

    pub fn build_message(&self, text: &str) -> Message {
        let mut builder = MessageBuilder::new().content(text);
        if let Some(user_id) = &self.discord.user_id {
            builder = builder.mention(user_id);
        }
        builder.build()
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    #[instrument(skip_all)]
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let message = self.build_message(text);

        let response = self
            .client
            .post(&self.discord.url)
            .json(&message)
            .send()
            .await
            .context("failed to send Discord message")?;

        if !response.status().is_success() {
            let status = response.status();
            if let Ok(error_text) = response.text().await {
                error!("Discord API error response: {}", error_text);
            }
            bail!("Discord message failed with status: {status}");
        }

        trace!("sent Discord message");
        Ok(())
    }
}
