// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{NewTweet, Tweet, User};
use super::traits::Database;
use crate::engine::store::{StoredTweet, TweetStore};

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory database with tables created. Used by tests and demos.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl TweetStore for SqliteDatabase {
    async fn tweets_for(&self, username: &str) -> Result<Vec<StoredTweet>> {
        let conn = self.conn.lock().await;
        let tweets = super::queries::get_tweets(&conn, username, None)?;
        Ok(tweets
            .into_iter()
            .map(|t| StoredTweet {
                text: t.text,
                vector: t.vector,
                vector_model: t.vector_model,
            })
            .collect())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn reset(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::reset(&conn)
    }

    async fn upsert_user(&self, username: &str, twitter_id: Option<&str>) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::upsert_user(&conn, username, twitter_id)
    }

    async fn set_newest_tweet_id(&self, user_id: i64, newest_tweet_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_newest_tweet_id(&conn, user_id, newest_tweet_id)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        super::queries::get_user(&conn, username)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock().await;
        super::queries::list_users(&conn)
    }

    async fn insert_tweets(&self, user_id: i64, tweets: &[NewTweet]) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::insert_tweets(&conn, user_id, tweets)
    }

    async fn get_tweets(&self, username: &str, limit: Option<u32>) -> Result<Vec<Tweet>> {
        let conn = self.conn.lock().await;
        super::queries::get_tweets(&conn, username, limit)
    }

    async fn tweet_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::tweet_count(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tweet(id: &str, text: &str) -> NewTweet {
        NewTweet {
            tweet_id: id.to_string(),
            text: text.to_string(),
            created_at: None,
            vector: Some(vec![1.0, 0.0]),
            vector_model: Some("test-model".to_string()),
        }
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = SqliteDatabase::in_memory().unwrap();
        assert_eq!(db.table_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_trait_user_and_tweets_roundtrip() {
        let db = SqliteDatabase::in_memory().unwrap();
        let id = db.upsert_user("alice", Some("42")).await.unwrap();
        let inserted = db
            .insert_tweets(id, &[new_tweet("1", "I love hiking")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let users = db.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].tweet_count, 1);
        assert_eq!(db.tweet_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tweets_for_carries_cached_vectors() {
        let db = SqliteDatabase::in_memory().unwrap();
        let id = db.upsert_user("alice", None).await.unwrap();
        db.insert_tweets(id, &[new_tweet("1", "mountains are great")])
            .await
            .unwrap();

        let tweets = db.tweets_for("alice").await.unwrap();
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].text, "mountains are great");
        assert!(tweets[0].cached_vector("test-model", 2).is_some());
    }

    #[tokio::test]
    async fn test_tweets_for_unknown_user_is_empty() {
        let db = SqliteDatabase::in_memory().unwrap();
        assert!(db.tweets_for("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trait_reset() {
        let db = SqliteDatabase::in_memory().unwrap();
        let id = db.upsert_user("alice", None).await.unwrap();
        db.insert_tweets(id, &[new_tweet("1", "hi")]).await.unwrap();
        db.reset().await.unwrap();
        assert!(db.get_user("alice").await.unwrap().is_none());
        assert_eq!(db.tweet_count().await.unwrap(), 0);
    }
}
