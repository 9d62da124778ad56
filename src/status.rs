// System status display — DB stats, stored users, active vectorizer.

use anyhow::Result;
use std::path::Path;

use crate::config::{Config, VectorizerBackend};

/// Display system status to the terminal.
pub async fn show(config: &Config) -> Result<()> {
    let db_display_path = config.db_path.as_str();
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `twitoff init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let db = crate::db::open_sqlite(db_display_path)?;

    let users = db.list_users().await?;
    let tweets = db.tweet_count().await?;
    println!("Users: {}  Tweets: {}", users.len(), tweets);
    if users.len() < 2 {
        println!("  Add at least two users with `twitoff add <username>` to compare");
    }

    match config.vectorizer_backend {
        VectorizerBackend::Hashing => {
            println!("Vectorizer: feature hashing ({} dims)", config.hash_dimension);
        }
        VectorizerBackend::Onnx => {
            let ready = crate::vectorize::download::embedding_files_present(&config.model_dir);
            println!(
                "Vectorizer: ONNX sentence embeddings ({})",
                if ready { "model present" } else { "model missing" }
            );
            if !ready {
                println!("  Run `twitoff download-model` to fetch it");
            }
        }
    }

    println!(
        "Twitter API: {}",
        if config.twitter_bearer_token.is_empty() {
            "no bearer token (offline import only)"
        } else {
            "bearer token configured"
        }
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::format_bytes;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
