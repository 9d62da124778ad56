// Data models — Rust structs that map to database rows.
//
// Separate from the queries so other modules can use them without
// depending on rusqlite directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user whose tweets have been ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Case-sensitive, exactly as it was first ingested.
    pub username: String,
    /// Twitter's numeric id, when the user came from the API.
    pub twitter_id: Option<String>,
    /// Highest tweet id seen, used as `since_id` on the next update.
    pub newest_tweet_id: Option<String>,
    pub tweet_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub tweet_id: String,
    pub text: String,
    pub created_at: Option<String>,
    /// Vector computed at ingestion (JSON-encoded in the DB)
    pub vector: Option<Vec<f64>>,
    pub vector_model: Option<String>,
}

/// A tweet about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTweet {
    pub tweet_id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub vector: Option<Vec<f64>>,
    pub vector_model: Option<String>,
}
