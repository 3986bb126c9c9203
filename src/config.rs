//! Configuration and settings management
//!
//! Loads settings from environment variables. Every key is required: a
//! missing or empty value is a fatal startup condition.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Messaging channel secret used for webhook signature verification
    pub line_channel_secret: String,
    /// Messaging channel access token for the push/reply API
    pub line_channel_access_token: String,
    /// Bucket holding the subscriber list blob
    pub s3_bucket_name: String,
    /// Object key of the subscriber list blob
    pub s3_key_name: String,
    /// Bearer token for the timeline API
    pub twitter_bearer_token: String,
    /// API key for the text-completion service
    pub openai_api_key: String,
}

impl Settings {
    /// Create new settings by loading from the environment
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any required key is absent or empty.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case;
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}
