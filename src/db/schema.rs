// Database schema — table creation.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        -- One row per ingested username
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,     -- case-sensitive as ingested
            twitter_id TEXT,                   -- numeric id from the API, if known
            newest_tweet_id TEXT,              -- since_id for incremental updates
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Tweets, each owned by exactly one user
        CREATE TABLE IF NOT EXISTS tweets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tweet_id TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT,                   -- RFC 3339, when known
            vector TEXT,                       -- JSON array computed at ingestion
            vector_model TEXT,                 -- model id that produced vector
            inserted_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, tweet_id)
        );

        -- Index for fetching a user's tweets
        CREATE INDEX IF NOT EXISTS idx_tweets_user
            ON tweets(user_id, created_at);
        ",
    )
    .context("Failed to create database tables")?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // users, tweets = 2 tables
        assert_eq!(table_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_tweet_ids_rejected_per_user() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute("INSERT INTO users (username) VALUES ('alice')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO tweets (user_id, tweet_id, text) VALUES (1, '10', 'hi')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO tweets (user_id, tweet_id, text) VALUES (1, '10', 'hi again')",
            [],
        );
        assert!(dup.is_err());
    }
}
