//! Broadcast loop over posts and subscribers
//!
//! Best-effort delivery: one failed push never stops the loop, it only
//! flags the run. There is no deduplication and no idempotency key; the
//! timer re-fires next period instead of retrying.

use crate::push::{self, OutboundMessage, PushClient};
use crate::timeline::Post;
use tracing::info;

/// Compose the outbound messages for one post: the body text, plus one
/// image attachment when the post carries media.
#[must_use]
pub fn messages_for(post: &Post) -> Vec<OutboundMessage> {
    let mut messages = vec![OutboundMessage::text(post.text.clone())];
    if let Some(url) = &post.media_url {
        messages.push(OutboundMessage::image(url.clone()));
    }
    messages
}

/// Send every post to every subscriber.
///
/// Returns true iff every push across the full cross product succeeded.
/// Failures are logged with the platform's full detail chain and the
/// remaining pairs are still attempted.
pub async fn broadcast(posts: &[Post], subscribers: &[String], push: &dyn PushClient) -> bool {
    let mut failed = false;

    for post in posts {
        let messages = messages_for(post);
        for subscriber in subscribers {
            if let Err(e) = push.push(subscriber, &messages).await {
                push::log_failure(&e);
                failed = true;
            }
        }
    }

    info!(
        "Broadcast finished: {} post(s) x {} subscriber(s), success: {}",
        posts.len(),
        subscribers.len(),
        !failed
    );
    !failed
}
