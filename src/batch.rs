//! Timer-triggered broadcast entrypoint
//!
//! One invocation: load the subscriber list, collect candidates across
//! every monitored account, broadcast, report success or failure. No
//! retries; the timer re-fires next period.

use crate::dispatch::broadcast;
use crate::feed::FeedSelector;
use crate::invocation::InvocationResponse;
use crate::push::PushClient;
use crate::registry::SubscriberRegistry;
use std::sync::Arc;
use tracing::{error, info};

/// The batch run and its collaborators
pub struct BatchJob {
    feed: FeedSelector,
    registry: SubscriberRegistry,
    push: Arc<dyn PushClient>,
}

impl BatchJob {
    /// Wire up a batch job from its collaborators
    #[must_use]
    pub fn new(feed: FeedSelector, registry: SubscriberRegistry, push: Arc<dyn PushClient>) -> Self {
        Self {
            feed,
            registry,
            push,
        }
    }

    /// Run one batch invocation to completion
    pub async fn run(&self) -> InvocationResponse {
        let subscribers = match self.registry.load().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to load subscriber list: {}", e);
                return InvocationResponse::error();
            }
        };

        let posts = match self.feed.collect_all().await {
            Ok(posts) => posts,
            Err(e) => {
                error!("Failed to collect candidates: {}", e);
                return InvocationResponse::error();
            }
        };

        info!(
            "Dispatching {} post(s) to {} subscriber(s)",
            posts.len(),
            subscribers.len()
        );

        if broadcast(&posts, &subscribers, self.push.as_ref()).await {
            InvocationResponse::ok()
        } else {
            InvocationResponse::error()
        }
    }
}
