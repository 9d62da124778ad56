// Errors a comparison can end in.
//
// Each domain condition is its own variant so the front end can tell
// "unknown user" from "same user" from "not enough data". Store and worker
// failures are infrastructure problems and kept separate from those.

use thiserror::Error;

use crate::vectorize::VectorizationError;

#[derive(Debug, Error)]
pub enum CompareError {
    /// Both usernames are the same.
    #[error("cannot compare @{0} to themselves")]
    SameUser(String),

    /// The user has no stored tweets (never ingested, or ingested nothing).
    #[error("no tweets stored for @{0}")]
    UnknownUser(String),

    /// Every stored tweet for the user failed vectorization.
    #[error("not enough usable tweets for @{0} to train a model")]
    InsufficientData(String),

    /// The candidate text could not be vectorized.
    #[error("candidate text could not be vectorized: {0}")]
    Vectorization(#[from] VectorizationError),

    /// Fitting the pair classifier failed.
    #[error("classifier training failed: {0}")]
    Training(String),

    /// Reading from the tweet store failed.
    #[error("tweet store error: {0:#}")]
    Store(#[source] anyhow::Error),

    /// The blocking worker running vectorization/training died.
    #[error("comparison worker failed: {0}")]
    Worker(String),
}
