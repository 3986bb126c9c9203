//! Timeline relay library.
//!
//! Polls monitored social-media timelines for posts matching keyword and
//! recency filters, broadcasts matches to registered messaging subscribers,
//! and maintains the subscriber list from join/leave webhook events.

/// Text-completion client for the assistant command.
pub mod assistant;
/// Timer-triggered broadcast entrypoint.
pub mod batch;
/// Configuration management.
pub mod config;
/// Broadcast loop over posts and subscribers.
pub mod dispatch;
/// Candidate selection across monitored accounts.
pub mod feed;
/// Post filtering predicates and the monitored-account table.
pub mod filter;
/// Entrypoint response envelope.
pub mod invocation;
/// Messaging-platform push client.
pub mod push;
/// Subscriber registry backed by blob storage.
pub mod registry;
/// Timeline source client.
pub mod timeline;
/// Webhook verification and command interpretation.
pub mod webhook;
