// Unit tests for the hashing vectorizer through its public interface.
//
// Covers the properties the classifier relies on: fixed dimension, unit
// length, determinism, and that texts sharing style or vocabulary land
// closer together than unrelated texts.

use twitoff::vectorize::hashing::{HashingVectorizer, DEFAULT_DIMENSION};
use twitoff::vectorize::{VectorizationError, Vectorizer};

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

// ============================================================
// Construction
// ============================================================

#[test]
fn default_dimension_is_used_in_model_id() {
    let v = HashingVectorizer::new(DEFAULT_DIMENSION).unwrap();
    assert_eq!(v.dimension(), 1024);
    assert_eq!(v.model_id(), "hashing-v1-d1024");
}

#[test]
fn different_dimensions_have_different_model_ids() {
    let a = HashingVectorizer::new(64).unwrap();
    let b = HashingVectorizer::new(128).unwrap();
    assert_ne!(a.model_id(), b.model_id());
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(HashingVectorizer::new(0).is_err());
}

// ============================================================
// Vector shape
// ============================================================

#[test]
fn vectors_are_unit_length() {
    let v = HashingVectorizer::new(256).unwrap();
    for text in ["hello", "Stocks rallied 3% today!!", "🚀🚀 to the moon", "@friend see https://t.co/x"] {
        let vec = v.vectorize(text).unwrap();
        assert_eq!(vec.len(), 256);
        assert!((norm(&vec) - 1.0).abs() < 1e-9, "not unit length for {text:?}");
    }
}

#[test]
fn tiny_dimension_still_works() {
    let v = HashingVectorizer::new(1).unwrap();
    let vec = v.vectorize("anything at all").unwrap();
    assert_eq!(vec.len(), 1);
    assert!((vec[0] - 1.0).abs() < 1e-12);
}

#[test]
fn empty_text_is_zero_vector() {
    let v = HashingVectorizer::new(32).unwrap();
    assert!(v.vectorize("").unwrap().iter().all(|x| *x == 0.0));
}

#[test]
fn whitespace_only_text_is_an_error_not_a_zero_vector() {
    let v = HashingVectorizer::new(64).unwrap();
    assert_eq!(v.vectorize("   \t "), Err(VectorizationError::NoTokens));
    assert_eq!(v.vectorize("\n"), Err(VectorizationError::NoTokens));
}

#[test]
fn stop_word_only_text_is_not_zero() {
    let v = HashingVectorizer::new(128).unwrap();
    assert!(norm(&v.vectorize("the and of").unwrap()) > 0.0);
}

#[test]
fn control_characters_are_untokenizable() {
    let v = HashingVectorizer::new(32).unwrap();
    assert_eq!(
        v.vectorize("bad\u{0}text"),
        Err(VectorizationError::Untokenizable('\u{0}'))
    );
    // Ordinary whitespace control characters are fine
    assert!(v.vectorize("line one\nline two\ttabbed").is_ok());
}

// ============================================================
// Determinism and similarity
// ============================================================

#[test]
fn same_text_same_vector_across_instances() {
    let a = HashingVectorizer::new(512).unwrap();
    let b = HashingVectorizer::new(512).unwrap();
    let text = "Launching the new rocket tomorrow morning 🚀";
    assert_eq!(a.vectorize(text).unwrap(), b.vectorize(text).unwrap());
}

#[test]
fn batch_matches_single() {
    let v = HashingVectorizer::new(128).unwrap();
    let texts = vec!["one fish".to_string(), "bad\u{1}".to_string(), "two fish".to_string()];
    let batch = v.vectorize_batch(&texts);
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0], v.vectorize("one fish"));
    assert!(batch[1].is_err());
    assert_eq!(batch[2], v.vectorize("two fish"));
}

#[test]
fn shared_vocabulary_is_closer_than_unrelated_text() {
    let v = HashingVectorizer::new(DEFAULT_DIMENSION).unwrap();
    let a = v.vectorize("Tesla stock prices surged after earnings").unwrap();
    let b = v.vectorize("stock prices fell after the earnings call").unwrap();
    let c = v.vectorize("my cat knocked the plant off the shelf").unwrap();
    assert!(cosine(&a, &b) > cosine(&a, &c));
}

#[test]
fn punctuation_habits_are_captured() {
    let v = HashingVectorizer::new(DEFAULT_DIMENSION).unwrap();
    let shouty = v.vectorize("great game!!!").unwrap();
    let shouty2 = v.vectorize("what a day!!!").unwrap();
    let calm = v.vectorize("what a day.").unwrap();
    assert!(cosine(&shouty, &shouty2) > 0.0);
    assert!(cosine(&calm, &shouty2) < 1.0);
}
