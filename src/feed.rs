//! Candidate selection across monitored accounts
//!
//! One bounded fetch per account, filtered against wall-clock "now". The
//! snapshot is not paginated: matches older than the fetch window are
//! silently not seen.

use crate::filter::{matches, watched_accounts, WatchedAccount};
use crate::timeline::{FetchOptions, Post, TimelineError, TimelineSource};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Selects forwardable posts from the timeline source
pub struct FeedSelector {
    timeline: Arc<dyn TimelineSource>,
}

impl FeedSelector {
    /// Create a selector over the given timeline source
    #[must_use]
    pub fn new(timeline: Arc<dyn TimelineSource>) -> Self {
        Self { timeline }
    }

    /// Fetch one snapshot for `account` and keep the posts its filter accepts
    ///
    /// # Errors
    ///
    /// Returns a `TimelineError` if the fetch fails.
    pub async fn select_candidates(
        &self,
        account: &WatchedAccount,
        opts: &FetchOptions,
    ) -> Result<Vec<Post>, TimelineError> {
        let posts = self.timeline.recent_posts(account.screen_name, opts).await?;
        let now = Utc::now();
        let candidates: Vec<Post> = posts
            .into_iter()
            .filter(|post| matches(post, &account.spec, now))
            .collect();

        info!(
            "{}: {} candidate(s) after filtering",
            account.screen_name,
            candidates.len()
        );
        Ok(candidates)
    }

    /// Concatenate candidates over the whole account table, in
    /// configuration order. A post matching under two accounts appears
    /// twice; the broadcast does not deduplicate.
    ///
    /// # Errors
    ///
    /// Returns a `TimelineError` if any account's fetch fails.
    pub async fn collect_all(&self) -> Result<Vec<Post>, TimelineError> {
        let mut all = Vec::new();
        for account in watched_accounts() {
            all.extend(
                self.select_candidates(&account, &FetchOptions::BATCH)
                    .await?,
            );
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use crate::timeline::MockTimelineSource;
    use chrono::Duration;
    use mockall::predicate::eq;

    fn fresh_post(text: &str) -> Post {
        Post {
            text: text.to_string(),
            created_at: Utc::now() - Duration::hours(1),
            media_url: None,
        }
    }

    #[tokio::test]
    async fn test_select_candidates_applies_filter() -> Result<(), TimelineError> {
        let mut timeline = MockTimelineSource::new();
        timeline
            .expect_recent_posts()
            .with(eq("DeadbyBHVR_JP"), eq(FetchOptions::BATCH))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    fresh_post("引き換えコード: dummy"),
                    fresh_post("関係ない告知"),
                ])
            });

        let account = WatchedAccount {
            screen_name: "DeadbyBHVR_JP",
            spec: FilterSpec::new(Duration::hours(12), &["引き換えコード"]),
        };

        let selector = FeedSelector::new(Arc::new(timeline));
        let candidates = selector
            .select_candidates(&account, &FetchOptions::BATCH)
            .await?;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "引き換えコード: dummy");
        Ok(())
    }

    #[tokio::test]
    async fn test_collect_all_queries_every_account_in_order() -> Result<(), TimelineError> {
        let mut timeline = MockTimelineSource::new();
        let mut order = mockall::Sequence::new();
        timeline
            .expect_recent_posts()
            .with(eq("DeadbyBHVR_JP"), eq(FetchOptions::BATCH))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok(vec![fresh_post("引き換えコード: a")]));
        timeline
            .expect_recent_posts()
            .with(eq("Ruby_Nea_"), eq(FetchOptions::BATCH))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok(vec![fresh_post("コード: b")]));

        let selector = FeedSelector::new(Arc::new(timeline));
        let all = selector.collect_all().await?;

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "引き換えコード: a");
        assert_eq!(all[1].text, "コード: b");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut timeline = MockTimelineSource::new();
        timeline.expect_recent_posts().returning(|_, _| {
            Err(TimelineError::Api {
                status: 429,
                body: "rate limited".into(),
            })
        });

        let selector = FeedSelector::new(Arc::new(timeline));
        assert!(selector.collect_all().await.is_err());
    }
}
