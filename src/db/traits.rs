// Database trait — async interface for everything outside the engine.
//
// Ingestion, listing and status go through this trait. The comparison
// engine only needs the narrower TweetStore read interface, which every
// Database also provides (it's a supertrait).

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewTweet, Tweet, User};
use crate::engine::store::TweetStore;

#[async_trait]
pub trait Database: TweetStore + Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Delete every user and tweet.
    async fn reset(&self) -> Result<()>;

    // --- Users ---

    /// Create the user if needed and return its row id.
    async fn upsert_user(&self, username: &str, twitter_id: Option<&str>) -> Result<i64>;

    /// Record the newest tweet id seen for a user.
    async fn set_newest_tweet_id(&self, user_id: i64, newest_tweet_id: &str) -> Result<()>;

    /// Look up a user by exact username.
    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    /// All users, alphabetically, with tweet counts.
    async fn list_users(&self) -> Result<Vec<User>>;

    // --- Tweets ---

    /// Insert tweets, skipping ones already stored. Returns rows inserted.
    async fn insert_tweets(&self, user_id: i64, tweets: &[NewTweet]) -> Result<usize>;

    /// A user's tweets, newest first.
    async fn get_tweets(&self, username: &str, limit: Option<u32>) -> Result<Vec<Tweet>>;

    /// Total stored tweets across all users.
    async fn tweet_count(&self) -> Result<i64>;
}
