// Ingestion pipeline — add a user or refresh everyone's tweets.
//
// For each user:
// 1. Resolve the username with the source
// 2. Fetch tweets newer than the newest one already stored
// 3. Vectorize them (on the blocking pool) so comparisons can reuse vectors
// 4. Upsert the user, insert the tweets, advance newest_tweet_id
//
// A tweet that fails vectorization is still stored, just without a cached
// vector; the comparison engine will retry and skip it there.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::source::{newest_id, TweetSource};
use crate::db::models::NewTweet;
use crate::db::Database;
use crate::vectorize::Vectorizer;

/// What one ingestion run did for a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub username: String,
    /// Tweets returned by the source.
    pub fetched: usize,
    /// New rows written (duplicates are ignored).
    pub inserted: usize,
    /// Tweets stored without a vector because vectorization failed.
    pub unvectorized: usize,
}

/// Add a new user or pull new tweets for an existing one.
pub async fn add_or_update_user(
    db: &dyn Database,
    source: &dyn TweetSource,
    vectorizer: &Arc<dyn Vectorizer>,
    username: &str,
    max_tweets: usize,
) -> Result<IngestReport> {
    let existing = db.get_user(username).await?;
    let since_id = existing.as_ref().and_then(|u| u.newest_tweet_id.clone());

    let source_user = source.fetch_user(username).await?;
    let fetched = source
        .fetch_timeline(&source_user, since_id.as_deref(), max_tweets)
        .await?;

    let texts: Vec<String> = fetched.iter().map(|t| t.text.clone()).collect();
    let model_id = vectorizer.model_id().to_string();
    let worker = Arc::clone(vectorizer);
    let vectors = tokio::task::spawn_blocking(move || worker.vectorize_batch(&texts))
        .await
        .context("Vectorization worker panicked")?;

    let mut unvectorized = 0;
    let new_tweets: Vec<NewTweet> = fetched
        .iter()
        .zip(vectors)
        .map(|(tweet, vector)| {
            let vector = match vector {
                Ok(v) => Some(v),
                Err(e) => {
                    unvectorized += 1;
                    warn!(
                        username = username,
                        tweet_id = %tweet.id,
                        error = %e,
                        "Storing tweet without a vector"
                    );
                    None
                }
            };
            NewTweet {
                tweet_id: tweet.id.clone(),
                text: tweet.text.clone(),
                created_at: tweet.created_at,
                vector_model: vector.as_ref().map(|_| model_id.clone()),
                vector,
            }
        })
        .collect();

    let user_id = db.upsert_user(username, source_user.id.as_deref()).await?;
    let inserted = db.insert_tweets(user_id, &new_tweets).await?;

    if let Some(newest) = newest_id(since_id.as_deref(), &fetched) {
        db.set_newest_tweet_id(user_id, newest).await?;
    }

    info!(
        username = username,
        fetched = fetched.len(),
        inserted = inserted,
        unvectorized = unvectorized,
        new_user = existing.is_none(),
        "Ingested tweets"
    );

    Ok(IngestReport {
        username: username.to_string(),
        fetched: fetched.len(),
        inserted,
        unvectorized,
    })
}

/// Refresh every stored user, `concurrency` at a time. One user's failure
/// doesn't stop the others — each outcome is returned alongside its username,
/// in alphabetical order.
pub async fn update_all_users(
    db: &dyn Database,
    source: &dyn TweetSource,
    vectorizer: &Arc<dyn Vectorizer>,
    max_tweets: usize,
    concurrency: usize,
) -> Result<Vec<(String, Result<IngestReport>)>> {
    let users = db.list_users().await?;
    info!(users = users.len(), "Updating all users");

    let mut outcomes: Vec<(String, Result<IngestReport>)> = stream::iter(users)
        .map(|user| async move {
            let result =
                add_or_update_user(db, source, vectorizer, &user.username, max_tweets).await;
            if let Err(ref e) = result {
                warn!(username = %user.username, error = %e, "Failed to update user");
            }
            (user.username, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(outcomes)
}
