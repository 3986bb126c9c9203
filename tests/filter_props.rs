use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use timeline_relay::filter::{matches, FilterSpec};
use timeline_relay::timeline::Post;

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

proptest! {
    /// A post older than the window never matches, whatever its text or
    /// the keyword set.
    #[test]
    fn stale_posts_never_match(
        text in "\\PC*",
        keywords in proptest::collection::vec("[a-z]{1,8}", 0..5),
        window_hours in 0i64..1000,
        staleness_secs in 1i64..1_000_000,
    ) {
        let now = timestamp(2_000_000_000);
        let window = Duration::hours(window_hours);
        let spec = FilterSpec {
            window,
            keywords: keywords.clone(),
        };
        let post = Post {
            text,
            created_at: now - window - Duration::seconds(staleness_secs),
            media_url: None,
        };
        prop_assert!(!matches(&post, &spec, now));
    }

    /// An empty keyword set matches nothing, however fresh the post.
    #[test]
    fn empty_keyword_set_never_matches(
        text in "\\PC*",
        age_secs in 0i64..3600,
    ) {
        let now = timestamp(2_000_000_000);
        let spec = FilterSpec {
            window: Duration::hours(12),
            keywords: Vec::new(),
        };
        let post = Post {
            text,
            created_at: now - Duration::seconds(age_secs),
            media_url: None,
        };
        prop_assert!(!matches(&post, &spec, now));
    }

    /// Same inputs, same answer.
    #[test]
    fn matches_is_deterministic(
        text in "\\PC*",
        keywords in proptest::collection::vec("\\PC{1,8}", 0..5),
        window_hours in 0i64..1000,
        age_secs in -1_000_000i64..1_000_000,
    ) {
        let now = timestamp(2_000_000_000);
        let spec = FilterSpec {
            window: Duration::hours(window_hours),
            keywords,
        };
        let post = Post {
            text,
            created_at: now - Duration::seconds(age_secs),
            media_url: None,
        };
        let first = matches(&post, &spec, now);
        let second = matches(&post, &spec, now);
        prop_assert_eq!(first, second);
    }

    /// A fresh post containing one of the keywords always matches.
    #[test]
    fn fresh_post_with_keyword_matches(
        prefix in "[a-z ]{0,20}",
        keyword in "[A-Z]{1,8}",
        suffix in "[a-z ]{0,20}",
        age_secs in 0i64..3600,
    ) {
        let now = timestamp(2_000_000_000);
        let spec = FilterSpec {
            window: Duration::hours(12),
            keywords: vec![keyword.clone()],
        };
        let post = Post {
            text: format!("{prefix}{keyword}{suffix}"),
            created_at: now - Duration::seconds(age_secs),
            media_url: None,
        };
        prop_assert!(matches(&post, &spec, now));
    }
}
