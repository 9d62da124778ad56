// Vectorizer trait — the swap-ready text → vector abstraction.
//
// The default implementation hashes word and character features into a
// fixed number of buckets. A local ONNX sentence embedder is available as
// an alternative. Both are loaded once at startup and shared read-only.

use thiserror::Error;

/// Why a piece of text could not be turned into a vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorizationError {
    /// The text contains a character the tokenizer refuses to handle
    /// (NUL and other non-whitespace control characters).
    #[error("text contains control character {0:?} and cannot be tokenized")]
    Untokenizable(char),

    /// Non-empty text that yields no tokens at all (e.g. only whitespace).
    #[error("text is non-empty but contains no tokens")]
    NoTokens,

    /// The model's tokenizer rejected the text.
    #[error("tokenizer failed: {0}")]
    Tokenizer(String),

    /// Inference itself failed.
    #[error("embedding model failed: {0}")]
    Model(String),
}

/// Deterministic mapping from raw text to a fixed-dimension vector.
///
/// Implementations must be pure: the same text always produces the same
/// vector for the lifetime of the process, and `dimension()` never changes.
pub trait Vectorizer: Send + Sync {
    /// Identifies the model (and its parameters) that produced a vector.
    /// Stored next to cached tweet vectors so stale ones can be detected.
    fn model_id(&self) -> &str;

    /// Length of every vector this vectorizer returns.
    fn dimension(&self) -> usize;

    /// Vectorize a single text.
    fn vectorize(&self, text: &str) -> Result<Vec<f64>, VectorizationError>;

    /// Vectorize several texts, returning one result per input in order.
    /// Default implementation calls `vectorize` sequentially — models that
    /// benefit from batching can override it.
    fn vectorize_batch(&self, texts: &[String]) -> Vec<Result<Vec<f64>, VectorizationError>> {
        texts.iter().map(|text| self.vectorize(text)).collect()
    }
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f64]) {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_error_messages_are_displayable() {
        let err = VectorizationError::Untokenizable('\0');
        assert!(err.to_string().contains("cannot be tokenized"));
        assert!(VectorizationError::NoTokens.to_string().contains("no tokens"));
    }
}
