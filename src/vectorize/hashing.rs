// Feature-hashing vectorizer — the default, zero-download text representation.
//
// Each tweet is broken into features:
//   - content words (stop words removed), e.g. "w:hiking"
//   - adjacent content-word bigrams, e.g. "b:stock prices"
//   - character trigrams of every word including stop words, e.g. "c:^hi"
//   - punctuation / emoji symbols, e.g. "s:!"
//   - placeholders for links and @mentions
// and every feature is hashed into one of D buckets with SHA-256, which is
// stable across platforms, builds and Rust versions. Counts are sub-linearly
// scaled (1 + ln tf) and the result is L2-normalized.
//
// Character trigrams and symbols are what make this useful for authorship:
// they capture spelling habits, punctuation and emoji use, not just topic.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use stop_words::{get, LANGUAGE};

use super::traits::{l2_normalize, VectorizationError, Vectorizer};

/// Default number of hash buckets.
pub const DEFAULT_DIMENSION: usize = 1024;

/// Hashing vectorizer. Cheap to share — all state is read-only after `new`.
pub struct HashingVectorizer {
    dimension: usize,
    model_id: String,
    url_re: Regex,
    mention_re: Regex,
    stop_words: HashSet<String>,
}

impl HashingVectorizer {
    /// Build a vectorizer producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            anyhow::bail!("Hashing vectorizer dimension must be at least 1");
        }

        let url_re =
            Regex::new(r"https?://\S+|www\.\S+").context("Failed to compile URL pattern")?;
        let mention_re =
            Regex::new(r"@[A-Za-z0-9_]+").context("Failed to compile mention pattern")?;

        let stop_words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();

        Ok(Self {
            dimension,
            model_id: format!("hashing-v1-d{dimension}"),
            url_re,
            mention_re,
            stop_words,
        })
    }

    /// Extract feature counts from text.
    ///
    /// A BTreeMap keeps iteration order fixed, so the floating-point sums in
    /// `vectorize` happen in the same order on every call.
    fn features(&self, text: &str) -> BTreeMap<String, u32> {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        let lower = text.to_lowercase();

        let urls = self.url_re.find_iter(&lower).count();
        let without_urls = self.url_re.replace_all(&lower, " ");
        let mentions = self.mention_re.find_iter(&without_urls).count();
        let cleaned = self.mention_re.replace_all(&without_urls, " ");

        if urls > 0 {
            *counts.entry("u:url".to_string()).or_default() += urls as u32;
        }
        if mentions > 0 {
            *counts.entry("u:mention".to_string()).or_default() += mentions as u32;
        }

        for symbol in cleaned
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            *counts.entry(format!("s:{symbol}")).or_default() += 1;
        }

        let words: Vec<&str> = cleaned
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|w| w.trim_matches('\''))
            .filter(|w| !w.is_empty())
            .collect();

        for word in &words {
            let padded: Vec<char> = format!("^{word}$").chars().collect();
            for tri in padded.windows(3) {
                let tri: String = tri.iter().collect();
                *counts.entry(format!("c:{tri}")).or_default() += 1;
            }
        }

        let content: Vec<&str> = words
            .iter()
            .copied()
            .filter(|w| !self.stop_words.contains(*w))
            .collect();

        for word in &content {
            *counts.entry(format!("w:{word}")).or_default() += 1;
        }
        for pair in content.windows(2) {
            *counts.entry(format!("b:{} {}", pair[0], pair[1])).or_default() += 1;
        }

        counts
    }

    fn bucket(&self, feature: &str) -> usize {
        let digest = Sha256::digest(feature.as_bytes());
        let hash = digest[..8]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        (hash % self.dimension as u64) as usize
    }
}

impl Vectorizer for HashingVectorizer {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Only the empty string maps to the zero vector. Non-empty text with no
    /// features fails with `NoTokens`.
    fn vectorize(&self, text: &str) -> Result<Vec<f64>, VectorizationError> {
        if let Some(c) = text.chars().find(|c| c.is_control() && !c.is_whitespace()) {
            return Err(VectorizationError::Untokenizable(c));
        }

        let mut vector = vec![0.0_f64; self.dimension];
        if text.is_empty() {
            return Ok(vector);
        }

        let features = self.features(text);
        if features.is_empty() {
            return Err(VectorizationError::NoTokens);
        }
        for (feature, tf) in features {
            vector[self.bucket(&feature)] += 1.0 + f64::from(tf).ln();
        }
        l2_normalize(&mut vector);

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingVectorizer::new(0).is_err());
    }

    #[test]
    fn test_vector_has_configured_dimension() {
        let v = HashingVectorizer::new(64).unwrap();
        assert_eq!(v.dimension(), 64);
        assert_eq!(v.vectorize("I love hiking").unwrap().len(), 64);
        assert_eq!(v.model_id(), "hashing-v1-d64");
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingVectorizer::new(32).unwrap();
        assert!(v.vectorize("").unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_whitespace_only_text_has_no_tokens() {
        let v = HashingVectorizer::new(64).unwrap();
        for text in ["   \t ", " ", "\n\n", "\u{3000}"] {
            assert_eq!(v.vectorize(text), Err(VectorizationError::NoTokens), "{text:?}");
        }
    }

    #[test]
    fn test_non_blank_text_is_never_zero() {
        let v = HashingVectorizer::new(32).unwrap();
        for text in ["the and of", "🔥🔥", "https://t.co/abc", "@someone", "'", "!!!"] {
            let vec = v.vectorize(text).unwrap();
            assert!(
                (norm(&vec) - 1.0).abs() < 1e-9,
                "{text:?} should produce a unit vector"
            );
        }
    }

    #[test]
    fn test_control_characters_fail() {
        let v = HashingVectorizer::new(32).unwrap();
        assert_eq!(
            v.vectorize("bad\0text"),
            Err(VectorizationError::Untokenizable('\0'))
        );
    }

    #[test]
    fn test_vectorize_is_deterministic() {
        let v = HashingVectorizer::new(256).unwrap();
        let a = v.vectorize("Quarterly earnings beat expectations!!").unwrap();
        let b = v.vectorize("Quarterly earnings beat expectations!!").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_separate_instances_agree() {
        let a = HashingVectorizer::new(256).unwrap();
        let b = HashingVectorizer::new(256).unwrap();
        assert_eq!(
            a.vectorize("mountains are great").unwrap(),
            b.vectorize("mountains are great").unwrap()
        );
    }

    #[test]
    fn test_case_insensitive() {
        let v = HashingVectorizer::new(256).unwrap();
        assert_eq!(
            v.vectorize("Stock Prices Today").unwrap(),
            v.vectorize("stock prices today").unwrap()
        );
    }

    #[test]
    fn test_different_texts_differ() {
        let v = HashingVectorizer::new(256).unwrap();
        assert_ne!(
            v.vectorize("I love hiking").unwrap(),
            v.vectorize("stock prices today").unwrap()
        );
    }

    #[test]
    fn test_stop_words_excluded_from_word_features() {
        let v = HashingVectorizer::new(64).unwrap();
        let features = v.features("the hiking");
        assert!(features.contains_key("w:hiking"));
        assert!(!features.contains_key("w:the"));
        // Stop words still contribute character trigrams
        assert!(features.contains_key("c:^th"));
    }

    #[test]
    fn test_links_and_mentions_become_placeholders() {
        let v = HashingVectorizer::new(64).unwrap();
        let features = v.features("thanks @bob see https://example.com/x");
        assert_eq!(features.get("u:url"), Some(&1));
        assert_eq!(features.get("u:mention"), Some(&1));
        assert!(!features.contains_key("w:bob"));
    }
}
