//! Script-based token splitting for code-mixed text.
//!
//! Notes mix transliterated Latin words with native-script words. Each script
//! gets its own Random-Indexing engine, so tokens are partitioned before any
//! language-specific processing:
//! 1. Split on whitespace
//! 2. A token is Latin iff every code point is ASCII (< 128)
//! 3. Latin tokens are lower-cased, native tokens are kept verbatim
//!
//! Punctuation and digits stay attached to their token.

/// Script a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Every character is ASCII
    Latin,
    /// At least one non-ASCII character
    Native,
}

/// Tokens of one text, partitioned by script. Order within each side is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitTokens {
    pub latin: Vec<String>,
    pub native: Vec<String>,
}

impl SplitTokens {
    /// Tokens for the given script.
    pub fn tokens(&self, script: Script) -> &[String] {
        match script {
            Script::Latin => &self.latin,
            Script::Native => &self.native,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latin.is_empty() && self.native.is_empty()
    }
}

/// Classify a single token.
pub fn classify(token: &str) -> Script {
    if token.chars().all(|c| (c as u32) < 128) {
        Script::Latin
    } else {
        Script::Native
    }
}

/// Split normalized text into Latin-script and native-script tokens.
pub fn split_languages(text: &str) -> SplitTokens {
    let mut split = SplitTokens::default();

    for token in text.split_whitespace() {
        match classify(token) {
            Script::Latin => split.latin.push(token.to_lowercase()),
            Script::Native => split.native.push(token.to_string()),
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ascii_is_latin() {
        assert_eq!(classify("doctor"), Script::Latin);
        assert_eq!(classify("Arun?"), Script::Latin);
        assert_eq!(classify("42"), Script::Latin);
    }

    #[test]
    fn test_classify_non_ascii_is_native() {
        assert_eq!(classify("అవ్వాలని"), Script::Native);
        // a single non-ASCII char is enough
        assert_eq!(classify("café"), Script::Native);
    }

    #[test]
    fn test_split_mixed_sentence() {
        let split = split_languages("Ravi doctor అవ్వాలని అనుకున్నాడు, కానీ Arun?");

        assert_eq!(split.latin, vec!["ravi", "doctor", "arun?"]);
        assert_eq!(split.native, vec!["అవ్వాలని", "అనుకున్నాడు,", "కానీ"]);
    }

    #[test]
    fn test_split_keeps_duplicates_and_order() {
        let split = split_languages("b a B a");
        assert_eq!(split.latin, vec!["b", "a", "b", "a"]);
        assert!(split.native.is_empty());
    }

    #[test]
    fn test_split_empty_and_whitespace() {
        assert!(split_languages("").is_empty());
        assert!(split_languages("  \n\t ").is_empty());
    }

    #[test]
    fn test_native_tokens_not_case_folded() {
        let split = split_languages("ÄBC");
        assert_eq!(split.native, vec!["ÄBC"]);
    }

    #[test]
    fn test_tokens_by_script() {
        let split = split_languages("hello నమస్తే");
        assert_eq!(split.tokens(Script::Latin), ["hello".to_string()]);
        assert_eq!(split.tokens(Script::Native), ["నమస్తే".to_string()]);
    }
}
