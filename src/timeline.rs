//! Timeline source client
//!
//! Fetches recent posts for a monitored account from the timeline API.
//! Posts are a transient snapshot; nothing here is persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const TIMELINE_ENDPOINT: &str = "https://api.twitter.com/1.1/statuses/user_timeline.json";

/// Errors that can occur while fetching a timeline
#[derive(Error, Debug)]
pub enum TimelineError {
    /// Connectivity failure talking to the timeline API
    #[error("timeline network error: {0}")]
    Network(String),
    /// Non-success response from the timeline API
    #[error("timeline API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the API
        body: String,
    },
    /// Response payload did not match the expected shape
    #[error("timeline parse error: {0}")]
    Parse(String),
}

/// One item from a monitored timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Full body text
    pub text: String,
    /// Creation timestamp, UTC
    pub created_at: DateTime<Utc>,
    /// URL of the first attached media item, if any
    pub media_url: Option<String>,
}

/// Fetch parameters for one timeline request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of posts to fetch
    pub count: u8,
    /// Whether replies are included in the snapshot
    pub include_replies: bool,
    /// Whether reposts are included in the snapshot
    pub include_reposts: bool,
}

impl FetchOptions {
    /// Fetch parameters for the periodic broadcast run
    pub const BATCH: Self = Self {
        count: 20,
        include_replies: true,
        include_reposts: false,
    };

    /// Fetch parameters for the scheduled-content webhook query
    pub const SCHEDULED_QUERY: Self = Self {
        count: 50,
        include_replies: false,
        include_reposts: false,
    };
}

/// Interface for timeline providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Fetch up to `opts.count` of the most recent posts for `account`
    async fn recent_posts(
        &self,
        account: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<Post>, TimelineError>;
}

/// Timeline client for the Twitter v1.1 user timeline endpoint
pub struct TwitterTimeline {
    http: reqwest::Client,
    bearer_token: String,
}

impl TwitterTimeline {
    /// Create a new timeline client using the given bearer token
    #[must_use]
    pub fn new(http: reqwest::Client, bearer_token: String) -> Self {
        Self { http, bearer_token }
    }
}

#[async_trait]
impl TimelineSource for TwitterTimeline {
    async fn recent_posts(
        &self,
        account: &str,
        opts: &FetchOptions,
    ) -> Result<Vec<Post>, TimelineError> {
        debug!("Fetching timeline for {} ({:?})", account, opts);

        let count = opts.count.to_string();
        let response = self
            .http
            .get(TIMELINE_ENDPOINT)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("screen_name", account),
                ("count", count.as_str()),
                ("tweet_mode", "extended"),
                ("exclude_replies", bool_param(!opts.include_replies)),
                ("include_rts", bool_param(opts.include_reposts)),
            ])
            .send()
            .await
            .map_err(|e| TimelineError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TimelineError::Api { status, body });
        }

        let statuses: Vec<TimelineStatus> = response
            .json()
            .await
            .map_err(|e| TimelineError::Parse(e.to_string()))?;

        statuses.into_iter().map(TimelineStatus::into_post).collect()
    }
}

const fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Wire shape of one status in the timeline response
#[derive(Debug, Deserialize)]
struct TimelineStatus {
    full_text: String,
    created_at: String,
    #[serde(default)]
    entities: StatusEntities,
}

#[derive(Debug, Deserialize, Default)]
struct StatusEntities {
    #[serde(default)]
    media: Vec<MediaEntity>,
}

#[derive(Debug, Deserialize)]
struct MediaEntity {
    media_url_https: String,
}

impl TimelineStatus {
    // Timestamps arrive as e.g. "Wed Oct 10 20:19:24 +0000 2018"
    fn into_post(self) -> Result<Post, TimelineError> {
        let created_at = DateTime::parse_from_str(&self.created_at, "%a %b %d %H:%M:%S %z %Y")
            .map_err(|e| TimelineError::Parse(format!("bad created_at {:?}: {e}", self.created_at)))?
            .with_timezone(&Utc);

        Ok(Post {
            text: self.full_text,
            created_at,
            media_url: self
                .entities
                .media
                .into_iter()
                .next()
                .map(|m| m.media_url_https),
        })
    }
}
