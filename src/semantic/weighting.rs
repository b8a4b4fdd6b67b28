//! Accumulation weight for Random-Indexing updates.

/// Weight applied to a context vector when a word is accumulated.
///
/// `exp(-delta * count / vocab_size)`: close to 1.0 for words that are rare
/// relative to the vocabulary, decaying towards 0 for words whose count
/// saturates it. Floored at `f64::MIN_POSITIVE` so the weight stays strictly
/// positive even when the exponent underflows.
///
/// Absolute values get very small: with the default `delta = 60`, the first
/// word of a fresh corpus (`count = 1`, `vocab_size = 1`) gets `e^-60`, about
/// `8.8e-27`. Cosine similarity only sees ratios, and rescales by the largest
/// component before squaring.
///
/// # Arguments
/// * `count` - Occurrence count of the word, after incrementing
/// * `vocab_size` - Vocabulary size, after inserting the word (0 is treated as 1)
/// * `delta` - Decay constant, must be positive
pub fn weight(count: u64, vocab_size: usize, delta: f64) -> f64 {
    let vocab_size = vocab_size.max(1) as f64;
    let ratio = count as f64 / vocab_size;

    (-delta * ratio).exp().max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_positive_and_finite() {
        for (count, vocab) in [(1, 1), (1, 1000), (1000, 1), (u64::MAX, 1)] {
            let w = weight(count, vocab, 60.0);
            assert!(w.is_finite());
            assert!(w > 0.0, "weight({count}, {vocab}) = {w}");
        }
    }

    #[test]
    fn test_weight_non_increasing_in_ratio() {
        let mut previous = f64::INFINITY;
        for count in 1..50 {
            let w = weight(count, 100, 60.0);
            assert!(w <= previous);
            previous = w;
        }
    }

    #[test]
    fn test_rare_word_near_maximum() {
        let w = weight(1, 100_000, 60.0);
        assert!(w > 0.99);
    }

    #[test]
    fn test_zero_vocab_treated_as_one() {
        assert_eq!(weight(1, 0, 2.0), weight(1, 1, 2.0));
    }

    #[test]
    fn test_delta_scales_decay() {
        assert!(weight(1, 10, 1.0) > weight(1, 10, 60.0));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(weight(3, 7, 60.0), weight(3, 7, 60.0));
    }

    #[test]
    fn test_first_word_of_fresh_corpus() {
        let w = weight(1, 1, 60.0);
        assert_eq!(w, (-60.0_f64).exp());
        assert!(w > 8.0e-27 && w < 9.0e-27);
    }
}
