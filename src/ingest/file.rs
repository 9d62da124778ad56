// File tweet source — import tweets from a local JSON export.
//
// Expected format: a JSON array of {"id": "...", "text": "...",
// "created_at": "2021-11-15T19:08:05Z"} objects (created_at optional).
// Useful for offline use and for seeding a database without API access.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::source::{id_cmp, FetchedTweet, SourceUser, TweetSource};

pub struct FileTweetSource {
    path: PathBuf,
}

impl FileTweetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<FetchedTweet>> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let tweets: Vec<FetchedTweet> = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a JSON array of tweets", self.path.display()))?;
        Ok(tweets)
    }
}

#[async_trait]
impl TweetSource for FileTweetSource {
    /// Any username is accepted — the file decides whose tweets these are.
    async fn fetch_user(&self, username: &str) -> Result<SourceUser> {
        Ok(SourceUser {
            id: None,
            username: username.to_string(),
        })
    }

    async fn fetch_timeline(
        &self,
        user: &SourceUser,
        since_id: Option<&str>,
        max_tweets: usize,
    ) -> Result<Vec<FetchedTweet>> {
        let mut tweets = self.read_all().await?;

        if let Some(since) = since_id {
            tweets.retain(|t| id_cmp(&t.id, since).is_gt());
        }

        // Newest first, matching the API
        tweets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| id_cmp(&b.id, &a.id))
        });
        tweets.truncate(max_tweets);

        info!(
            count = tweets.len(),
            username = %user.username,
            path = %self.path.display(),
            "Read tweets from file"
        );

        Ok(tweets)
    }
}
