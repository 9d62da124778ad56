// Vectorization — text → fixed-dimension vectors for the classifier.

pub mod download;
pub mod hashing;
pub mod onnx;
pub mod traits;

pub use traits::{VectorizationError, Vectorizer};
