// Sentence embedding vectorizer using all-MiniLM-L6-v2.
//
// Hashed features only see shared words and character patterns. This
// module embeds text into 384-dimensional vectors with a sentence
// transformer, so "the market rallied" lands near "quarterly earnings
// report" even though they share no words.
//
// The model runs locally via ONNX — no API calls, no rate limits.
// Mean pooling and L2 normalization match the model's training pipeline.
// `Session::run` needs `&mut self`, so the session is behind a Mutex; all
// calls come from the blocking thread pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};
use tracing::debug;

use super::traits::{l2_normalize, VectorizationError, Vectorizer};

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Model id recorded next to cached tweet vectors.
pub const MODEL_ID: &str = "all-MiniLM-L6-v2";

/// Sentence embedder backed by a local ONNX model.
pub struct OnnxVectorizer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxVectorizer {
    /// Load the sentence embedding model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    /// Run `twitoff download-model` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `twitoff download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `twitoff download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!(
            "Loaded sentence embedding model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Run one forward pass over already-tokenized texts.
    fn embed_encodings(&self, encodings: &[Encoding]) -> Result<Vec<Vec<f64>>, VectorizationError> {
        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if batch_size == 0 || max_len == 0 {
            return Err(VectorizationError::Tokenizer(
                "tokenizer produced no tokens".to_string(),
            ));
        }

        // BERT inputs, right-padded to max_len:
        //   input_ids: token IDs (pad with 0)
        //   attention_mask: 1 for real tokens, 0 for padding
        //   token_type_ids: all zeros for single-sentence input
        let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for enc in encodings {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let seq_len = ids.len();
            let pad_len = max_len - seq_len;

            input_ids_flat.extend(ids.iter().map(|&id| i64::from(id)));
            input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask_flat.extend(mask.iter().map(|&m| i64::from(m)));
            attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
            token_type_ids_flat.extend(std::iter::repeat_n(0i64, max_len));
        }

        let shape = [batch_size as i64, max_len as i64];
        let model_err = |e: ort::Error| VectorizationError::Model(e.to_string());

        let input_ids_tensor = Tensor::from_array((shape, input_ids_flat)).map_err(model_err)?;
        let attention_mask_tensor =
            Tensor::from_array((shape, attention_mask_flat.clone())).map_err(model_err)?;
        let token_type_ids_tensor =
            Tensor::from_array((shape, token_type_ids_flat)).map_err(model_err)?;

        // Output is last_hidden_state: [batch, seq_len, 384]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| VectorizationError::Model(format!("session lock poisoned: {e}")))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .map_err(model_err)?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(model_err)?;

            data.to_vec()
        };

        if hidden_states.len() < batch_size * max_len * EMBEDDING_DIM {
            return Err(VectorizationError::Model(format!(
                "unexpected output size {} for batch of {batch_size} x {max_len}",
                hidden_states.len()
            )));
        }

        // Mean pooling weighted by the attention mask, then unit length.
        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut sum = vec![0.0_f64; EMBEDDING_DIM];
            let mut mask_sum = 0.0_f64;

            for j in 0..max_len {
                let mask_val = attention_mask_flat[i * max_len + j] as f64;
                if mask_val > 0.0 {
                    mask_sum += mask_val;
                    let offset = (i * max_len + j) * EMBEDDING_DIM;
                    for (k, slot) in sum.iter_mut().enumerate() {
                        *slot += f64::from(hidden_states[offset + k]) * mask_val;
                    }
                }
            }

            if mask_sum > 0.0 {
                for val in &mut sum {
                    *val /= mask_sum;
                }
            }
            l2_normalize(&mut sum);
            embeddings.push(sum);
        }

        debug!(
            batch_size = batch_size,
            dim = EMBEDDING_DIM,
            "Computed sentence embeddings"
        );

        Ok(embeddings)
    }

    fn encode(&self, text: &str) -> Result<Encoding, VectorizationError> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| VectorizationError::Tokenizer(e.to_string()))
    }
}

impl Vectorizer for OnnxVectorizer {
    fn model_id(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn vectorize(&self, text: &str) -> Result<Vec<f64>, VectorizationError> {
        let encoding = self.encode(text)?;
        let mut embeddings = self.embed_encodings(&[encoding])?;
        embeddings
            .pop()
            .ok_or_else(|| VectorizationError::Model("model returned no embedding".to_string()))
    }

    /// Tokenize each text on its own so one bad tweet only fails itself,
    /// then run every successfully tokenized text through a single forward
    /// pass.
    fn vectorize_batch(&self, texts: &[String]) -> Vec<Result<Vec<f64>, VectorizationError>> {
        let encoded: Vec<Result<Encoding, VectorizationError>> =
            texts.iter().map(|t| self.encode(t)).collect();

        let good: Vec<Encoding> = encoded
            .iter()
            .filter_map(|r| r.as_ref().ok().cloned())
            .collect();

        let mut embedded = match self.embed_encodings(&good) {
            Ok(vectors) => vectors.into_iter(),
            Err(e) => {
                return encoded
                    .into_iter()
                    .map(|r| r.and(Err(e.clone())))
                    .collect();
            }
        };

        encoded
            .into_iter()
            .map(|r| {
                r.and_then(|_| {
                    embedded.next().ok_or_else(|| {
                        VectorizationError::Model("batch output shorter than input".to_string())
                    })
                })
            })
            .collect()
    }
}
