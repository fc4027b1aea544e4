use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("invalid webhook url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to the reply service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("reply body could not be read: {0}")]
    Body(#[source] reqwest::Error),
}

/// A response from the reply service, body already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyResponse {
    pub status: u16,
    pub body: String,
}

impl ReplyResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The remote endpoint that turns user text into assistant replies.
///
/// Any status code is returned as `Ok`; `Err` means no response could be
/// obtained at all.
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn exchange(&self, message: &str) -> Result<ReplyResponse, ReplyError>;
}

#[derive(Serialize)]
struct WebhookRequest<'a> {
    message: &'a str,
}

pub struct WebhookClient {
    url: Url,
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(webhook_url: &str) -> Result<Self, ReplyError> {
        let url = Url::parse(webhook_url).map_err(|source| ReplyError::InvalidUrl {
            url: webhook_url.to_string(),
            source,
        })?;

        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl ReplyService for WebhookClient {
    async fn exchange(&self, message: &str) -> Result<ReplyResponse, ReplyError> {
        debug!("Posting message to webhook {}", self.url);

        // .json() sets Content-Type: application/json
        let response = self
            .client
            .post(self.url.clone())
            .json(&WebhookRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.map_err(ReplyError::Body)?;

        if status.is_success() {
            debug!("Webhook replied with {}: {}", status, body);
        } else {
            warn!("Webhook request failed with {}: {}", status, body);
        }

        Ok(ReplyResponse::new(status.as_u16(), body))
    }
}
