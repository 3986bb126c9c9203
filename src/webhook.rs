//! Webhook verification and command interpretation
//!
//! One inbound request carries a signed JSON envelope of events. The
//! interpreter is stateless: each event produces at most one reply, and
//! anything unrecognized is dropped without side effects. Verification
//! fails closed: a bad signature or malformed envelope yields an error
//! response and no event is processed.

use crate::assistant::{AssistantError, Completion};
use crate::dispatch::messages_for;
use crate::feed::FeedSelector;
use crate::filter::scheduled_content_account;
use crate::invocation::InvocationResponse;
use crate::push::{self, OutboundMessage, PushClient, PushError};
use crate::registry::{StorageError, SubscriberRegistry};
use crate::timeline::{FetchOptions, TimelineError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Exact trigger phrase for the scheduled-content query
pub const SCHEDULED_CONTENT_TRIGGER: &str = "今週の聖堂";
/// Command token for the assistant query
pub const ASSISTANT_COMMAND: &str = "/chatgpt";

const SIGNATURE_HEADER: &str = "x-line-signature";

/// Errors that can occur while handling a webhook request
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The payload's signature did not verify against the channel secret
    #[error("invalid webhook signature")]
    Signature,
    /// The body was not a well-formed event envelope
    #[error("malformed webhook envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    /// Timeline fetch failed while answering a command
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    /// Reply could not be delivered
    #[error(transparent)]
    Push(#[from] PushError),
    /// Subscriber list read or write failed
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Completion request failed
    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

/// Inbound request as delivered by the surrounding infrastructure
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    /// Request headers; the signature header name is matched
    /// case-insensitively
    pub headers: HashMap<String, String>,
    /// Raw request body
    pub body: String,
}

/// Verify the body's HMAC-SHA256 signature (base64-encoded) against the
/// channel secret, in constant time.
#[must_use]
pub fn verify_signature(body: &[u8], signature: &str, channel_secret: &str) -> bool {
    let Ok(signature_bytes) = BASE64.decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    computed.as_slice().ct_eq(&signature_bytes).into()
}

/// Event envelope: one webhook call delivers one or more events
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    /// Events in delivery order
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One inbound event, dispatched on its `type` tag
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    /// A message was sent where the bot is present
    Message {
        /// Token for the single allowed reply
        #[serde(rename = "replyToken")]
        reply_token: String,
        /// Message payload; only text is interpreted
        message: MessagePayload,
    },
    /// The bot joined a group or room
    Join {
        /// Where the event originated
        source: EventSource,
    },
    /// The bot left (or was removed from) a group or room
    Leave {
        /// Where the event originated
        source: EventSource,
    },
    /// Any event kind this relay does not handle
    #[serde(other)]
    Other,
}

/// Message payload variants; non-text payloads are ignored
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    /// Plain text message
    Text {
        /// Message text
        text: String,
    },
    /// Stickers, images, and anything else
    #[serde(other)]
    Other,
}

/// Origin of an event: a group, a room, or a single user
#[derive(Debug, Default, Deserialize)]
pub struct EventSource {
    /// Group id when sent in a group
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    /// Room id when sent in a multi-person room
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
    /// User id for one-on-one chats
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl EventSource {
    /// The id replies and subscriptions should target, preferring the
    /// containing group or room over the individual user
    #[must_use]
    pub fn sender_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.room_id.as_deref())
            .or(self.user_id.as_deref())
    }
}

/// Stateless interpreter for inbound webhook events
pub struct Interpreter {
    feed: FeedSelector,
    registry: SubscriberRegistry,
    push: Arc<dyn PushClient>,
    assistant: Arc<dyn Completion>,
    channel_secret: String,
}

impl Interpreter {
    /// Wire up an interpreter from its collaborators
    #[must_use]
    pub fn new(
        feed: FeedSelector,
        registry: SubscriberRegistry,
        push: Arc<dyn PushClient>,
        assistant: Arc<dyn Completion>,
        channel_secret: String,
    ) -> Self {
        Self {
            feed,
            registry,
            push,
            assistant,
            channel_secret,
        }
    }

    /// Handle one webhook request end to end: verify, parse, dispatch
    /// every event. Any failure is logged and surfaced as a 500-equivalent
    /// response.
    pub async fn handle_request(&self, request: &WebhookRequest) -> InvocationResponse {
        match self.process(request).await {
            Ok(()) => InvocationResponse::ok(),
            Err(WebhookError::Push(e)) => {
                push::log_failure(&e);
                InvocationResponse::error()
            }
            Err(WebhookError::Signature) => {
                error!("Detected invalid signature");
                InvocationResponse::error()
            }
            Err(e) => {
                error!("Webhook handling failed: {}", e);
                InvocationResponse::error()
            }
        }
    }

    async fn process(&self, request: &WebhookRequest) -> Result<(), WebhookError> {
        let signature = signature_header(&request.headers).unwrap_or_default();
        if !verify_signature(request.body.as_bytes(), signature, &self.channel_secret) {
            return Err(WebhookError::Signature);
        }

        let envelope: WebhookEnvelope = serde_json::from_str(&request.body)?;
        info!("Webhook envelope with {} event(s)", envelope.events.len());

        for event in envelope.events {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    /// Dispatch one event on its kind
    ///
    /// # Errors
    ///
    /// Returns a `WebhookError` if a collaborator call fails.
    pub async fn handle_event(&self, event: WebhookEvent) -> Result<(), WebhookError> {
        match event {
            WebhookEvent::Message {
                reply_token,
                message: MessagePayload::Text { text },
            } => self.handle_text(&text, &reply_token).await,
            WebhookEvent::Message { .. } => Ok(()),
            WebhookEvent::Join { source } => match source.sender_id() {
                Some(id) => Ok(self.registry.add(id).await?),
                None => {
                    warn!("Join event without a sender id");
                    Ok(())
                }
            },
            WebhookEvent::Leave { source } => match source.sender_id() {
                Some(id) => Ok(self.registry.remove(id).await?),
                None => {
                    warn!("Leave event without a sender id");
                    Ok(())
                }
            },
            WebhookEvent::Other => Ok(()),
        }
    }

    async fn handle_text(&self, text: &str, reply_token: &str) -> Result<(), WebhookError> {
        if text == SCHEDULED_CONTENT_TRIGGER {
            return self.reply_scheduled_content(reply_token).await;
        }

        if let Some(argument) = text.strip_prefix(ASSISTANT_COMMAND) {
            // The token must be followed by a space and a non-empty prompt
            let prompt = argument.strip_prefix(' ').map(str::trim).unwrap_or("");
            if prompt.is_empty() {
                return Ok(());
            }

            let answer = self.assistant.complete(prompt).await?;
            self.push
                .reply(reply_token, &[OutboundMessage::text(answer)])
                .await?;
        }

        // Any other text: no reply, no side effect
        Ok(())
    }

    async fn reply_scheduled_content(&self, reply_token: &str) -> Result<(), WebhookError> {
        let account = scheduled_content_account();
        let candidates = self
            .feed
            .select_candidates(&account, &FetchOptions::SCHEDULED_QUERY)
            .await?;

        let Some(first) = candidates.first() else {
            info!("No scheduled content found, not replying");
            return Ok(());
        };

        self.push.reply(reply_token, &messages_for(first)).await?;
        Ok(())
    }
}

/// Case-insensitive lookup of the signature header
fn signature_header(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SIGNATURE_HEADER))
        .map(|(_, value)| value.as_str())
}
