use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::GroupMeConfig;

#[derive(Debug, Serialize)]
struct BotPost<'a> {
    bot_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a [Value]>,
}

/// Posts messages to a GroupMe group as a bot.
pub struct GroupMeClient {
    client: reqwest::Client,
    config: GroupMeConfig,
}

impl GroupMeClient {
    pub fn new(config: GroupMeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build GroupMe client")?;
        Ok(Self { client, config })
    }

    pub fn has_bot_id(&self) -> bool {
        !self.config.bot_id.trim().is_empty()
    }

    fn post_url(&self) -> String {
        format!("{}/bots/post", self.config.api_base_url.trim_end_matches('/'))
    }

    /// Post `text` to the bot's group. Without a bot id this logs and does nothing.
    pub async fn post(&self, text: &str, attachments: Option<&[Value]>) -> Result<()> {
        if !self.has_bot_id() {
            warn!("GroupMe bot_id missing, not posting");
            return Ok(());
        }

        let body = BotPost {
            bot_id: self.config.bot_id.trim(),
            text,
            attachments,
        };

        let url = self.post_url();
        debug!("Posting to GroupMe: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send post to GroupMe")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("GroupMe API error ({}): {}", status, error_body);
        }

        info!("Posted to GroupMe ({})", status);
        Ok(())
    }

    /// Post in the background. The caller does not wait for the result;
    /// failures are logged and dropped.
    pub fn dispatch(self: &Arc<Self>, text: String) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = client.post(&text, None).await {
                error!("Background post failed: {:#}", e);
            }
        })
    }
}
