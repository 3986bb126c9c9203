//! Messaging-platform push client
//!
//! Thin client for the LINE Messaging API push and reply operations. API
//! failures carry the platform's top-level message plus every nested detail
//! entry so the dispatch loop can log the full chain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";
const REPLY_ENDPOINT: &str = "https://api.line.me/v2/bot/message/reply";

/// One outbound message object, in the platform's wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Plain text message
    Text {
        /// Message body
        text: String,
    },
    /// Image message; content and preview point at the same media URL
    Image {
        /// Full-size image URL
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        /// Preview image URL
        #[serde(rename = "previewImageUrl")]
        preview_image_url: String,
    },
}

impl OutboundMessage {
    /// Text message from any string-ish value
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Image message pointing content and preview at one URL
    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }
}

/// Error body returned by the messaging API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Top-level error message
    #[serde(default)]
    pub message: String,
    /// Nested per-property error entries
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// One nested error-detail entry
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Offending request property
    #[serde(default)]
    pub property: String,
    /// Detail message
    #[serde(default)]
    pub message: String,
}

/// Errors that can occur while pushing messages
#[derive(Error, Debug)]
pub enum PushError {
    /// Connectivity failure talking to the messaging API
    #[error("push network error: {0}")]
    Network(String),
    /// The messaging API rejected the request
    #[error("messaging API error: {}", .0.message)]
    Api(ApiErrorBody),
}

/// Interface for message push providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushClient: Send + Sync {
    /// Push `messages` to one subscriber
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), PushError>;
    /// Reply to an inbound event identified by `reply_token`
    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), PushError>;
}

/// LINE Messaging API client
pub struct LineMessaging {
    http: reqwest::Client,
    access_token: String,
}

impl LineMessaging {
    /// Create a new client using the given channel access token
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self { http, access_token }
    }

    async fn post_messages(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<(), PushError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| PushError::Network(e.to_string()))?;

        if response.status().is_success() {
            debug!("Messaging API accepted request to {}", endpoint);
            return Ok(());
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(parse_api_error(status, &text))
    }
}

#[async_trait]
impl PushClient for LineMessaging {
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), PushError> {
        let body = serde_json::json!({ "to": to, "messages": messages });
        self.post_messages(PUSH_ENDPOINT, &body).await
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), PushError> {
        let body = serde_json::json!({ "replyToken": reply_token, "messages": messages });
        self.post_messages(REPLY_ENDPOINT, &body).await
    }
}

/// Log a push failure with the platform's top-level message and every
/// nested detail entry.
pub fn log_failure(err: &PushError) {
    match err {
        PushError::Network(message) => {
            error!("Push request failed: {}", message);
        }
        PushError::Api(body) => {
            error!("Got exception from messaging API: {}", body.message);
            for detail in &body.details {
                error!("  {}: {}", detail.property, detail.message);
            }
        }
    }
}

/// Turn a non-success response into a `PushError`, keeping every detail
/// entry the platform provided. Unparseable bodies fall back to the raw
/// status line.
fn parse_api_error(status: u16, body: &str) -> PushError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => PushError::Api(parsed),
        _ => PushError::Api(ApiErrorBody {
            message: format!("HTTP {status}: {body}"),
            details: Vec::new(),
        }),
    }
}
