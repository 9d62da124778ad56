// Database queries — CRUD operations for users and tweets.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewTweet, Tweet, User};

// --- Users ---

/// Create the user if needed and return its row id. An existing user keeps
/// its twitter_id unless a new one is supplied.
pub fn upsert_user(conn: &Connection, username: &str, twitter_id: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, twitter_id)
         VALUES (?1, ?2)
         ON CONFLICT(username) DO UPDATE SET
            twitter_id = COALESCE(?2, twitter_id),
            updated_at = datetime('now')",
        params![username, twitter_id],
    )?;

    let id: i64 = conn.query_row(
        "SELECT id FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Record the newest tweet id seen for a user.
pub fn set_newest_tweet_id(conn: &Connection, user_id: i64, newest_tweet_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET newest_tweet_id = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![user_id, newest_tweet_id],
    )?;
    Ok(())
}

const USER_COLUMNS: &str = "u.id, u.username, u.twitter_id, u.newest_tweet_id,
        (SELECT COUNT(*) FROM tweets t WHERE t.user_id = u.id),
        u.created_at, u.updated_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        twitter_id: row.get(2)?,
        newest_tweet_id: row.get(3)?,
        tweet_count: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Look up a user by exact (case-sensitive) username.
pub fn get_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"
    ))?;
    let result = stmt.query_row(params![username], user_from_row).optional()?;
    Ok(result)
}

/// All users, alphabetically.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u ORDER BY u.username"
    ))?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

// --- Tweets ---

/// Insert tweets for a user, ignoring ones already stored (same tweet id).
/// Returns how many rows were actually inserted.
pub fn insert_tweets(conn: &Connection, user_id: i64, tweets: &[NewTweet]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .context("Failed to start tweet insert transaction")?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO tweets (user_id, tweet_id, text, created_at, vector, vector_model)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for tweet in tweets {
            let vector_json = tweet
                .vector
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            inserted += stmt.execute(params![
                user_id,
                tweet.tweet_id,
                tweet.text,
                tweet.created_at.map(|t| t.to_rfc3339()),
                vector_json,
                tweet.vector_model,
            ])?;
        }
    }

    tx.commit().context("Failed to commit tweets")?;
    Ok(inserted)
}

/// A user's tweets, newest first. Tweets without a timestamp sort last,
/// in reverse insertion order.
pub fn get_tweets(conn: &Connection, username: &str, limit: Option<u32>) -> Result<Vec<Tweet>> {
    let mut stmt = conn.prepare(
        "SELECT t.tweet_id, t.text, t.created_at, t.vector, t.vector_model
         FROM tweets t
         JOIN users u ON u.id = t.user_id
         WHERE u.username = ?1
         ORDER BY t.created_at IS NULL, t.created_at DESC, t.id DESC
         LIMIT ?2",
    )?;

    // SQLite treats a negative LIMIT as "no limit"
    let limit = limit.map(i64::from).unwrap_or(-1);

    let rows = stmt.query_map(params![username, limit], |row| {
        let vector_json: Option<String> = row.get(3)?;
        Ok(Tweet {
            tweet_id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            // A corrupt cached vector is just a cache miss
            vector: vector_json.and_then(|json| serde_json::from_str(&json).ok()),
            vector_model: row.get(4)?,
        })
    })?;

    let mut tweets = Vec::new();
    for row in rows {
        tweets.push(row?);
    }
    Ok(tweets)
}

/// Total number of stored tweets across all users.
pub fn tweet_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tweets", [], |row| row.get(0))?;
    Ok(count)
}

/// Delete every user and tweet.
pub fn reset(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM tweets;
         DELETE FROM users;",
    )
    .context("Failed to reset database")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::TimeZone;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn tweet(id: &str, text: &str, day: Option<u32>) -> NewTweet {
        NewTweet {
            tweet_id: id.to_string(),
            text: text.to_string(),
            created_at: day.map(|d| chrono::Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()),
            vector: None,
            vector_model: None,
        }
    }

    #[test]
    fn test_upsert_user_is_idempotent() {
        let conn = test_conn();
        let a = upsert_user(&conn, "alice", None).unwrap();
        let b = upsert_user(&conn, "alice", Some("123")).unwrap();
        assert_eq!(a, b);
        let user = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(user.twitter_id.as_deref(), Some("123"));

        // A later upsert without an id keeps the known one
        upsert_user(&conn, "alice", None).unwrap();
        let user = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(user.twitter_id.as_deref(), Some("123"));
    }

    #[test]
    fn test_get_user_is_case_sensitive() {
        let conn = test_conn();
        upsert_user(&conn, "Alice", None).unwrap();
        assert!(get_user(&conn, "alice").unwrap().is_none());
        assert!(get_user(&conn, "Alice").unwrap().is_some());
    }

    #[test]
    fn test_insert_tweets_ignores_duplicates() {
        let conn = test_conn();
        let id = upsert_user(&conn, "alice", None).unwrap();
        let first = insert_tweets(&conn, id, &[tweet("1", "a", None), tweet("2", "b", None)]).unwrap();
        assert_eq!(first, 2);
        let second = insert_tweets(&conn, id, &[tweet("2", "b", None), tweet("3", "c", None)]).unwrap();
        assert_eq!(second, 1);
        assert_eq!(tweet_count(&conn).unwrap(), 3);
        assert_eq!(get_user(&conn, "alice").unwrap().unwrap().tweet_count, 3);
    }

    #[test]
    fn test_get_tweets_newest_first() {
        let conn = test_conn();
        let id = upsert_user(&conn, "alice", None).unwrap();
        insert_tweets(
            &conn,
            id,
            &[
                tweet("1", "old", Some(1)),
                tweet("3", "undated", None),
                tweet("2", "new", Some(5)),
            ],
        )
        .unwrap();

        let texts: Vec<String> = get_tweets(&conn, "alice", None)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["new", "old", "undated"]);

        assert_eq!(get_tweets(&conn, "alice", Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_vector_roundtrip() {
        let conn = test_conn();
        let id = upsert_user(&conn, "alice", None).unwrap();
        let mut t = tweet("1", "hello", None);
        t.vector = Some(vec![0.25, -0.5]);
        t.vector_model = Some("hashing-v1-d2".to_string());
        insert_tweets(&conn, id, &[t]).unwrap();

        let stored = get_tweets(&conn, "alice", None).unwrap();
        assert_eq!(stored[0].vector, Some(vec![0.25, -0.5]));
        assert_eq!(stored[0].vector_model.as_deref(), Some("hashing-v1-d2"));
    }

    #[test]
    fn test_get_tweets_unknown_user_is_empty() {
        let conn = test_conn();
        assert!(get_tweets(&conn, "nobody", None).unwrap().is_empty());
    }

    #[test]
    fn test_list_users_sorted() {
        let conn = test_conn();
        upsert_user(&conn, "carol", None).unwrap();
        upsert_user(&conn, "alice", None).unwrap();
        let names: Vec<String> = list_users(&conn)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }

    #[test]
    fn test_newest_tweet_id() {
        let conn = test_conn();
        let id = upsert_user(&conn, "alice", None).unwrap();
        set_newest_tweet_id(&conn, id, "999").unwrap();
        let user = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(user.newest_tweet_id.as_deref(), Some("999"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let conn = test_conn();
        let id = upsert_user(&conn, "alice", None).unwrap();
        insert_tweets(&conn, id, &[tweet("1", "a", None)]).unwrap();
        reset(&conn).unwrap();
        assert!(list_users(&conn).unwrap().is_empty());
        assert_eq!(tweet_count(&conn).unwrap(), 0);
    }
}
