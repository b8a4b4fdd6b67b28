//! Text preparation before indexing and embedding.
//!
//! Transliteration of code-mixed input is left to a `Normalizer`
//! implementation supplied by the caller. The built-in
//! `WhitespaceNormalizer` only trims and collapses whitespace.

use std::hash::{Hash, Hasher};

/// Converts raw user text into the normalized form that gets indexed.
///
/// Must be total and deterministic: the same input always yields the same output.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;
}

/// Trims the text and collapses every whitespace run into one space.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceNormalizer;

impl Normalizer for WhitespaceNormalizer {
    fn normalize(&self, raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Hash of normalized note text, used to detect stale cached embeddings.
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.trim().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_collapsed() {
        let normalizer = WhitespaceNormalizer;
        assert_eq!(
            normalizer.normalize("  Ravi\tdoctor \n\n అవ్వాలని  "),
            "Ravi doctor అవ్వాలని"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(WhitespaceNormalizer.normalize(" \n "), "");
    }

    #[test]
    fn test_case_and_punctuation_untouched() {
        assert_eq!(WhitespaceNormalizer.normalize("Arun?"), "Arun?");
    }

    #[test]
    fn test_content_hash_consistency() {
        assert_eq!(content_hash("ravi doctor"), content_hash("ravi doctor"));
    }

    #[test]
    fn test_content_hash_differs() {
        assert_ne!(content_hash("ravi doctor"), content_hash("arun doctor"));
    }

    #[test]
    fn test_content_hash_trims() {
        assert_eq!(content_hash("  ravi  "), content_hash("ravi"));
    }
}
