use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::LineConfig;

/// A message sent through the reply or push API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text { text: String },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMessageRequest {
    pub reply_token: String,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessageRequest {
    pub to: String,
    pub messages: Vec<OutboundMessage>,
    pub notification_disabled: bool,
}

/// The two Messaging API calls the relay makes.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn reply_message(&self, request: &ReplyMessageRequest) -> Result<()>;
    async fn push_message(&self, request: &PushMessageRequest) -> Result<()>;
}

pub struct LineClient {
    client: reqwest::Client,
    base_url: String,
    channel_token: String,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            channel_token: config.channel_token.clone(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);

        debug!("Sending request to LINE: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.channel_token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("LINE API error ({}): {}", status, error_body);
        }

        Ok(())
    }
}

#[async_trait]
impl MessagingApi for LineClient {
    async fn reply_message(&self, request: &ReplyMessageRequest) -> Result<()> {
        self.post("/v2/bot/message/reply", request).await
    }

    async fn push_message(&self, request: &PushMessageRequest) -> Result<()> {
        self.post("/v2/bot/message/push", request).await
    }
}
