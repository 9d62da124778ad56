use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::classify::TrainerConfig;

/// Which vectorizer turns tweets into vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorizerBackend {
    /// Feature hashing (default) — no model files needed
    Hashing,
    /// Local ONNX sentence embeddings — run `twitoff download-model` first
    Onnx,
}

/// Central configuration loaded from environment variables.
///
/// Secrets come from env vars (never hardcoded). The .env file is loaded
/// automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Twitter API v2 bearer token — only needed for `add` and `update`
    pub twitter_bearer_token: String,
    pub twitter_api_url: String,
    pub vectorizer_backend: VectorizerBackend,
    /// Number of buckets for the hashing vectorizer
    pub hash_dimension: usize,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Weight training samples so both users count equally
    pub balance_classes: bool,
    /// How many tweets to fetch per user per update
    pub max_tweets: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the bearer token, which is only
    /// checked by commands that talk to Twitter.
    pub fn load() -> Result<Self> {
        let vectorizer_backend = match env::var("TWITOFF_VECTORIZER").as_deref() {
            Ok("onnx") => VectorizerBackend::Onnx,
            Ok("hashing") | Err(_) => VectorizerBackend::Hashing,
            Ok(other) => anyhow::bail!(
                "Unknown TWITOFF_VECTORIZER '{other}'. Use 'hashing' or 'onnx'."
            ),
        };

        let hash_dimension = match env::var("TWITOFF_HASH_DIM") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("TWITOFF_HASH_DIM must be a positive integer, got '{v}'"))?,
            Err(_) => crate::vectorize::hashing::DEFAULT_DIMENSION,
        };

        let max_tweets = match env::var("TWITOFF_MAX_TWEETS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("TWITOFF_MAX_TWEETS must be a positive integer, got '{v}'"))?,
            Err(_) => 200,
        };

        let balance_classes = matches!(
            env::var("TWITOFF_BALANCE_CLASSES").as_deref(),
            Ok("1") | Ok("true") | Ok("yes")
        );

        let model_dir = env::var("TWITOFF_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::vectorize::download::default_model_dir());

        Ok(Self {
            db_path: env::var("TWITOFF_DB_PATH").unwrap_or_else(|_| "./twitoff.db".to_string()),
            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN").unwrap_or_default(),
            twitter_api_url: env::var("TWITTER_API_URL")
                .unwrap_or_else(|_| crate::ingest::twitter::DEFAULT_API_URL.to_string()),
            vectorizer_backend,
            hash_dimension,
            model_dir,
            balance_classes,
            max_tweets,
        })
    }

    /// Training hyperparameters derived from the config.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            balance_classes: self.balance_classes,
            ..TrainerConfig::default()
        }
    }

    /// Check that the Twitter bearer token is configured.
    /// Call this before any operation that fetches from the API.
    pub fn require_twitter(&self) -> Result<()> {
        if self.twitter_bearer_token.is_empty() {
            anyhow::bail!(
                "TWITTER_BEARER_TOKEN not set. Add it to your .env file,\n\
                 or use `twitoff import <username> <file.json>` to load tweets offline."
            );
        }
        Ok(())
    }

    /// Validate that the chosen vectorizer has what it needs.
    pub fn require_vectorizer(&self) -> Result<()> {
        match self.vectorizer_backend {
            VectorizerBackend::Hashing => {
                if self.hash_dimension == 0 {
                    anyhow::bail!("TWITOFF_HASH_DIM must be at least 1");
                }
                Ok(())
            }
            VectorizerBackend::Onnx => {
                if !crate::vectorize::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX embedding model not found in {}\n\
                         Run `twitoff download-model` to download it.\n\
                         Or set TWITOFF_VECTORIZER=hashing to use feature hashing instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
        }
    }
}
