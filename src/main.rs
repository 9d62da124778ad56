use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use twitoff::config::{self, Config};
use twitoff::vectorize::Vectorizer;

/// Twitoff: which of two Twitter users is more likely to have said something?
///
/// Ingest tweets for a few users, then ask which of two of them a piece of
/// text sounds like. A fresh classifier is trained for every question.
#[derive(Parser)]
#[command(name = "twitoff", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Fetch a user's tweets from the Twitter API (or refresh them)
    Add {
        /// Twitter username, with or without the leading @
        username: String,
    },

    /// Load a user's tweets from a local JSON file instead of the API
    Import {
        username: String,
        /// JSON array of {"id", "text", "created_at"} objects
        file: std::path::PathBuf,
    },

    /// Pull new tweets for every stored user
    Update {
        /// Number of users to fetch in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// List stored users
    Users,

    /// Show a user's stored tweets
    Tweets {
        username: String,
        /// Max tweets to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Predict which of two users is more likely to have written some text
    Compare {
        user0: String,
        user1: String,
        /// The text to attribute
        text: String,
    },

    /// Delete every stored user and tweet
    Reset,

    /// Show system status (DB stats, users, vectorizer)
    Status,

    /// Download the ONNX sentence embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("twitoff=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Twitoff database...");
            let config = Config::load()?;
            let db = twitoff::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nTwitoff is ready. Next step: set TWITTER_BEARER_TOKEN in your .env file");
            println!("Then run: twitoff add <username>");
        }

        Commands::Add { username } => {
            let config = Config::load()?;
            config.require_twitter()?;
            config.require_vectorizer()?;
            let db = twitoff::db::initialize_sqlite(&config.db_path)?;
            let vectorizer = create_vectorizer(&config)?;
            let client = twitoff::ingest::twitter::TwitterClient::new(
                &config.twitter_api_url,
                &config.twitter_bearer_token,
            )?;

            let username = normalize_username(&username);
            println!("Fetching tweets for @{username}...");
            let report = twitoff::ingest::add_or_update_user(
                db.as_ref(),
                &client,
                &vectorizer,
                username,
                config.max_tweets,
            )
            .await?;
            twitoff::output::terminal::display_ingest_report(&report);
        }

        Commands::Import { username, file } => {
            let config = Config::load()?;
            config.require_vectorizer()?;
            let db = twitoff::db::initialize_sqlite(&config.db_path)?;
            let vectorizer = create_vectorizer(&config)?;
            let source = twitoff::ingest::file::FileTweetSource::new(&file);

            let username = normalize_username(&username);
            println!("Importing tweets for @{username} from {}...", file.display());
            let report = twitoff::ingest::add_or_update_user(
                db.as_ref(),
                &source,
                &vectorizer,
                username,
                config.max_tweets,
            )
            .await?;
            twitoff::output::terminal::display_ingest_report(&report);
        }

        Commands::Update { concurrency } => {
            let config = Config::load()?;
            config.require_twitter()?;
            config.require_vectorizer()?;
            let db = twitoff::db::open_sqlite(&config.db_path)?;
            let vectorizer = create_vectorizer(&config)?;
            let client = twitoff::ingest::twitter::TwitterClient::new(
                &config.twitter_api_url,
                &config.twitter_bearer_token,
            )?;

            println!("Updating all users...");
            let outcomes = twitoff::ingest::update_all_users(
                db.as_ref(),
                &client,
                &vectorizer,
                config.max_tweets,
                concurrency,
            )
            .await?;

            let mut failed = 0;
            for (username, outcome) in &outcomes {
                match outcome {
                    Ok(report) => twitoff::output::terminal::display_ingest_report(report),
                    Err(e) => {
                        failed += 1;
                        println!("  @{:<24} {} {e:#}", username, "failed:".red());
                    }
                }
            }
            println!(
                "\n{}",
                format!("Updated {} users ({} failed)", outcomes.len() - failed, failed).bold()
            );
        }

        Commands::Users => {
            let config = Config::load()?;
            let db = twitoff::db::open_sqlite(&config.db_path)?;
            let users = db.list_users().await?;
            twitoff::output::terminal::display_users(&users);
        }

        Commands::Tweets { username, limit } => {
            let config = Config::load()?;
            let db = twitoff::db::open_sqlite(&config.db_path)?;
            let username = normalize_username(&username);
            let tweets = db.get_tweets(username, Some(limit)).await?;
            twitoff::output::terminal::display_tweets(username, &tweets);
        }

        Commands::Compare { user0, user1, text } => {
            let config = Config::load()?;
            config.require_vectorizer()?;
            let db = twitoff::db::open_sqlite(&config.db_path)?;
            let vectorizer = create_vectorizer(&config)?;
            let trainer = twitoff::classify::LogisticTrainer::new(config.trainer_config());
            let engine = twitoff::engine::ComparisonEngine::new(db, vectorizer, trainer);

            let user0 = normalize_username(&user0);
            let user1 = normalize_username(&user1);
            match engine.compare(user0, user1, &text).await {
                Ok(comparison) => twitoff::output::terminal::display_comparison(&comparison),
                Err(e) => {
                    twitoff::output::terminal::display_compare_error(&e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Reset => {
            let config = Config::load()?;
            let db = twitoff::db::open_sqlite(&config.db_path)?;
            let users = db.list_users().await?.len();
            let tweets = db.tweet_count().await?;
            db.reset().await?;
            println!("Deleted {users} users and {tweets} tweets.");
        }

        Commands::Status => {
            let config = Config::load()?;
            twitoff::status::show(&config).await?;
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX model...");
            println!("  Destination: {}", model_dir.display());

            let dir = twitoff::vectorize::download::download_model(model_dir).await?;

            println!("\n{} {}", "Model ready at".bold(), dir.display());
            println!("Set TWITOFF_VECTORIZER=onnx to use sentence embeddings.");
        }
    }

    Ok(())
}

/// Strip a leading @ so `@alice` and `alice` name the same user.
fn normalize_username(username: &str) -> &str {
    username.strip_prefix('@').unwrap_or(username)
}

/// Create the vectorizer selected by the config.
fn create_vectorizer(config: &Config) -> Result<Arc<dyn Vectorizer>> {
    match config.vectorizer_backend {
        config::VectorizerBackend::Hashing => {
            info!(dimension = config.hash_dimension, "Using feature hashing vectorizer");
            let vectorizer =
                twitoff::vectorize::hashing::HashingVectorizer::new(config.hash_dimension)?;
            Ok(Arc::new(vectorizer))
        }
        config::VectorizerBackend::Onnx => {
            info!("Using local ONNX sentence embeddings");
            let dir = twitoff::vectorize::download::embedding_model_dir(&config.model_dir);
            let vectorizer = twitoff::vectorize::onnx::OnnxVectorizer::load(&dir)?;
            Ok(Arc::new(vectorizer))
        }
    }
}
