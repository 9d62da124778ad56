// Tweet source trait — where ingested tweets come from.
//
// TwitterClient talks to the Twitter API v2; FileTweetSource reads a local
// JSON export. The update pipeline doesn't care which.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tweet as delivered by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A user as resolved by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUser {
    /// Source-specific id (Twitter's numeric id), if the source has one.
    pub id: Option<String>,
    pub username: String,
}

#[async_trait]
pub trait TweetSource: Send + Sync {
    /// Resolve a username. Fails if the source doesn't know it.
    async fn fetch_user(&self, username: &str) -> Result<SourceUser>;

    /// Fetch up to `max_tweets` of the user's original tweets (no replies,
    /// no retweets), newest first. With `since_id`, only tweets newer than it.
    async fn fetch_timeline(
        &self,
        user: &SourceUser,
        since_id: Option<&str>,
        max_tweets: usize,
    ) -> Result<Vec<FetchedTweet>>;
}

/// Compare two tweet ids. Twitter ids are numeric snowflakes, so numeric
/// comparison is chronological; non-numeric ids fall back to string order.
pub fn id_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// The newest id among `current` and the fetched tweets.
pub fn newest_id<'a>(current: Option<&'a str>, tweets: &'a [FetchedTweet]) -> Option<&'a str> {
    tweets
        .iter()
        .map(|t| t.id.as_str())
        .chain(current)
        .max_by(|a, b| id_cmp(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(id: &str) -> FetchedTweet {
        FetchedTweet {
            id: id.to_string(),
            text: "x".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_id_cmp_is_numeric() {
        // String order would put "9" after "10"
        assert_eq!(id_cmp("9", "10"), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_newest_id_includes_current() {
        let tweets = vec![fetched("5"), fetched("12")];
        assert_eq!(newest_id(Some("100"), &tweets), Some("100"));
        assert_eq!(newest_id(Some("3"), &tweets), Some("12"));
        assert_eq!(newest_id(None, &[]), None);
    }

    #[test]
    fn test_fetched_tweet_deserializes_without_timestamp() {
        let tweet: FetchedTweet = serde_json::from_str(r#"{"id":"1","text":"hi"}"#).unwrap();
        assert_eq!(tweet.created_at, None);
    }
}
