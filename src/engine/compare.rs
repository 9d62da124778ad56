// Comparison engine — "which of these two users more likely wrote this?"
//
// For every call:
// 1. Reject identical usernames, then sort the pair lexicographically so
//    compare(a, b) and compare(b, a) train on exactly the same data
// 2. Read both users' tweets from the store
// 3. Vectorize the candidate and every tweet (cached vectors reused)
// 4. Fit a fresh logistic regression on the pair
// 5. Predict the candidate's label
// 6. Map the canonical label back to the caller's argument order
//
// Nothing is cached between calls. Steps 3-5 are CPU-bound and run on the
// blocking thread pool so async callers stay responsive.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::store::{StoredTweet, TweetStore};
use crate::classify::{FitError, Label, LogisticTrainer};
use crate::error::CompareError;
use crate::vectorize::Vectorizer;

/// The answer to a comparison, relative to the caller's argument order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// The username the classifier attributes the text to.
    pub chosen_username: String,
    /// The other username.
    pub other_username: String,
    /// `Label::Zero` if the first argument was chosen, `Label::One` if the second.
    pub label: Label,
    /// Model probability that `chosen_username` wrote the text (>= 0.5).
    pub probability: f64,
    /// Human-readable summary.
    pub message: String,
}

/// Orchestrates store → vectorizer → trainer. Stateless apart from shared,
/// read-only collaborators, so one engine can serve concurrent calls.
pub struct ComparisonEngine<S: TweetStore + ?Sized> {
    store: Arc<S>,
    vectorizer: Arc<dyn Vectorizer>,
    trainer: LogisticTrainer,
}

impl<S: TweetStore + ?Sized> ComparisonEngine<S> {
    pub fn new(store: Arc<S>, vectorizer: Arc<dyn Vectorizer>, trainer: LogisticTrainer) -> Self {
        Self {
            store,
            vectorizer,
            trainer,
        }
    }

    /// Predict which of `user_a` / `user_b` is more likely to have written
    /// `candidate_text`.
    pub async fn compare(
        &self,
        user_a: &str,
        user_b: &str,
        candidate_text: &str,
    ) -> Result<Comparison, CompareError> {
        if user_a == user_b {
            return Err(CompareError::SameUser(user_a.to_string()));
        }

        let (first, second) = canonical_pair(user_a, user_b);

        let first_tweets = self.fetch(first).await?;
        let second_tweets = self.fetch(second).await?;

        let vectorizer = Arc::clone(&self.vectorizer);
        let trainer = self.trainer.clone();
        let pair = [
            (first.to_string(), first_tweets),
            (second.to_string(), second_tweets),
        ];
        let candidate = candidate_text.to_string();

        let scored = tokio::task::spawn_blocking(move || {
            score_pair(vectorizer.as_ref(), &trainer, pair, &candidate)
        })
        .await
        .map_err(|e| CompareError::Worker(e.to_string()))??;

        // Canonical label → literal username → caller-facing label
        let (chosen, other) = match scored.label {
            Label::Zero => (first, second),
            Label::One => (second, first),
        };
        let label = if chosen == user_a {
            Label::Zero
        } else {
            Label::One
        };
        let probability = match scored.label {
            Label::Zero => 1.0 - scored.probability_one,
            Label::One => scored.probability_one,
        };

        info!(
            user_a = user_a,
            user_b = user_b,
            chosen = chosen,
            probability = probability,
            "Comparison complete"
        );

        Ok(Comparison {
            chosen_username: chosen.to_string(),
            other_username: other.to_string(),
            label,
            probability,
            message: prediction_message(candidate_text, chosen, other),
        })
    }

    async fn fetch(&self, username: &str) -> Result<Vec<StoredTweet>, CompareError> {
        let tweets = self
            .store
            .tweets_for(username)
            .await
            .map_err(CompareError::Store)?;

        if tweets.is_empty() {
            return Err(CompareError::UnknownUser(username.to_string()));
        }

        debug!(username = username, tweets = tweets.len(), "Fetched tweets");
        Ok(tweets)
    }
}

/// Lexicographic (byte-order) sort of the two usernames.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The sentence shown to users for a prediction.
pub fn prediction_message(text: &str, chosen: &str, other: &str) -> String {
    format!("'{text}' is more likely to be said by {chosen} than {other}!")
}

struct PairScore {
    label: Label,
    probability_one: f64,
}

/// Vectorize, fit and predict for a canonically ordered pair.
fn score_pair(
    vectorizer: &dyn Vectorizer,
    trainer: &LogisticTrainer,
    pair: [(String, Vec<StoredTweet>); 2],
    candidate: &str,
) -> Result<PairScore, CompareError> {
    let candidate_vector = vectorizer.vectorize(candidate)?;

    let [(first_name, first_tweets), (second_name, second_tweets)] = pair;
    let first_vectors = usable_vectors(vectorizer, &first_name, &first_tweets)?;
    let second_vectors = usable_vectors(vectorizer, &second_name, &second_tweets)?;

    let model = trainer
        .fit(&first_vectors, &second_vectors)
        .map_err(|e| match e {
            FitError::InsufficientData(Label::Zero) => CompareError::InsufficientData(first_name),
            FitError::InsufficientData(Label::One) => CompareError::InsufficientData(second_name),
            FitError::Training(msg) => CompareError::Training(msg),
        })?;

    Ok(PairScore {
        label: model.predict(&candidate_vector),
        probability_one: model.probability(&candidate_vector),
    })
}

/// Vectors for one user's tweets. Valid cached vectors are reused; the
/// rest are computed. Tweets that fail vectorization are skipped with a
/// warning — only an empty result is an error.
fn usable_vectors(
    vectorizer: &dyn Vectorizer,
    username: &str,
    tweets: &[StoredTweet],
) -> Result<Vec<Vec<f64>>, CompareError> {
    let model_id = vectorizer.model_id();
    let dimension = vectorizer.dimension();

    let mut vectors = Vec::with_capacity(tweets.len());
    let mut pending = Vec::new();
    for tweet in tweets {
        match tweet.cached_vector(model_id, dimension) {
            Some(v) => vectors.push(v.to_vec()),
            None => pending.push(tweet.text.clone()),
        }
    }
    let cached = vectors.len();

    let mut skipped = 0;
    for (text, result) in pending.iter().zip(vectorizer.vectorize_batch(&pending)) {
        match result {
            Ok(v) => vectors.push(v),
            Err(e) => {
                skipped += 1;
                warn!(
                    username = username,
                    error = %e,
                    text_preview = %crate::output::truncate_chars(text, 50),
                    "Skipping tweet that failed vectorization"
                );
            }
        }
    }

    debug!(
        username = username,
        cached = cached,
        computed = pending.len() - skipped,
        skipped = skipped,
        "Vectorized tweets"
    );

    if vectors.is_empty() {
        return Err(CompareError::InsufficientData(username.to_string()));
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_sorts() {
        assert_eq!(canonical_pair("bob", "alice"), ("alice", "bob"));
        assert_eq!(canonical_pair("alice", "bob"), ("alice", "bob"));
    }

    #[test]
    fn test_canonical_pair_is_case_sensitive_byte_order() {
        // Uppercase sorts before lowercase in byte order
        assert_eq!(canonical_pair("alice", "Bob"), ("Bob", "alice"));
    }

    #[test]
    fn test_prediction_message_format() {
        assert_eq!(
            prediction_message("hi there", "bob", "alice"),
            "'hi there' is more likely to be said by bob than alice!"
        );
    }
}
