// `twitoff download-model` — fetch the ONNX sentence embedder.
//
// Files go to <model_dir>/<onnx::MODEL_ID>/ (model_dir defaults to the
// platform data dir, e.g. ~/.local/share/twitoff/models/ on Linux). Each
// file streams into a `.part` sibling and is renamed only once complete, so
// an interrupted download never looks installed. After downloading, the
// model is loaded and run once to check it yields EMBEDDING_DIM vectors.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::onnx::{OnnxVectorizer, EMBEDDING_DIM, MODEL_ID};
use super::Vectorizer;

/// Files `OnnxVectorizer::load` needs: (path in the HuggingFace repo, local name).
const MODEL_FILES: [(&str, &str); 2] = [
    ("tokenizer.json", "tokenizer.json"),
    ("onnx/model.onnx", "model.onnx"),
];

pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("twitoff")
        .join("models")
}

/// Where the embedder's files live under `base`.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(MODEL_ID)
}

/// True when every file the embedder loads is in place.
pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    MODEL_FILES
        .iter()
        .all(|(_, local)| dir.join(local).is_file())
}

fn file_url(remote: &str) -> String {
    format!("https://huggingface.co/sentence-transformers/{MODEL_ID}/resolve/main/{remote}")
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Download any missing model files, then check the model loads and embeds.
/// Returns the directory the vectorizer should be loaded from.
pub async fn download_model(base: &Path) -> Result<PathBuf> {
    let dir = embedding_model_dir(base);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create model directory {}", dir.display()))?;

    println!("\nSentence embedding model ({MODEL_ID}):");
    let client = reqwest::Client::new();

    for (remote, local) in MODEL_FILES {
        let dest = dir.join(local);
        if dest.is_file() {
            println!("  {local} (already present)");
            continue;
        }
        println!("  Downloading {local}...");
        stream_to_file(&client, &file_url(remote), &dest).await?;
    }

    let check_dir = dir.clone();
    tokio::task::spawn_blocking(move || verify_model(&check_dir))
        .await
        .context("Model check panicked")??;

    info!(dir = %dir.display(), model = MODEL_ID, "Embedding model ready");
    Ok(dir)
}

/// Load the model and embed one sentence.
fn verify_model(dir: &Path) -> Result<()> {
    let vectorizer = OnnxVectorizer::load(dir)?;
    let vector = vectorizer
        .vectorize("twitoff model check")
        .context("Downloaded model failed to embed a test sentence")?;
    if vector.len() != EMBEDDING_DIM {
        anyhow::bail!(
            "Downloaded model produced {} dims, expected {EMBEDDING_DIM}. Delete {} and retry.",
            vector.len(),
            dir.display()
        );
    }
    Ok(())
}

async fn stream_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;
    if !response.status().is_success() {
        anyhow::bail!("Download of {url} failed with status {}", response.status());
    }

    let pb = match response.content_length() {
        Some(size) => ProgressBar::new(size).with_style(
            ProgressStyle::default_bar()
                .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                .progress_chars("=> "),
        ),
        None => ProgressBar::new_spinner()
            .with_style(ProgressStyle::default_spinner().template("    {spinner} {bytes}")?),
    };

    let part = partial_path(dest);
    let mut file = tokio::fs::File::create(&part)
        .await
        .with_context(|| format!("Failed to create {}", part.display()))?;

    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {url} was interrupted"))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", part.display()))?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&part, dest)
        .await
        .with_context(|| format!("Failed to move {} into place", part.display()))?;
    pb.finish_and_clear();

    info!(url = url, bytes = pb.position(), dest = %dest.display(), "Downloaded model file");
    Ok(())
}
