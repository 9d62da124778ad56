// Tweet store adapter — the only thing the comparison engine reads from.
//
// The SQLite database implements this; so does InMemoryTweetStore, which
// is handy for tests and for callers that already hold tweets in memory.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

/// A tweet as the engine sees it: text plus an optional cached vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTweet {
    pub text: String,
    /// Vector computed at ingestion time, if any.
    pub vector: Option<Vec<f64>>,
    /// `Vectorizer::model_id` of the model that produced `vector`.
    pub vector_model: Option<String>,
}

impl StoredTweet {
    /// A tweet with no cached vector.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vector: None,
            vector_model: None,
        }
    }

    /// The cached vector, if it was made by `model_id` with `dimension`
    /// entries and is fully finite.
    pub fn cached_vector(&self, model_id: &str, dimension: usize) -> Option<&[f64]> {
        match (&self.vector, &self.vector_model) {
            (Some(v), Some(m))
                if m == model_id && v.len() == dimension && v.iter().all(|x| x.is_finite()) =>
            {
                Some(v.as_slice())
            }
            _ => None,
        }
    }
}

#[async_trait]
pub trait TweetStore: Send + Sync {
    /// All stored tweets for `username`, newest first. Unknown users yield
    /// an empty list rather than an error.
    async fn tweets_for(&self, username: &str) -> Result<Vec<StoredTweet>>;
}

/// Immutable in-memory store, built up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTweetStore {
    users: HashMap<String, Vec<StoredTweet>>,
}

impl InMemoryTweetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a user's tweets from plain text.
    pub fn with_user<I, T>(mut self, username: &str, tweets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.users.insert(
            username.to_string(),
            tweets.into_iter().map(StoredTweet::text_only).collect(),
        );
        self
    }

    /// Add (or replace) a user's tweets, cached vectors included.
    pub fn with_stored(mut self, username: &str, tweets: Vec<StoredTweet>) -> Self {
        self.users.insert(username.to_string(), tweets);
        self
    }
}

#[async_trait]
impl TweetStore for InMemoryTweetStore {
    async fn tweets_for(&self, username: &str) -> Result<Vec<StoredTweet>> {
        Ok(self.users.get(username).cloned().unwrap_or_default())
    }
}
