use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeMap, HashSet};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::AnalyzerConfig;

fn stemmer_algorithm(language: &str) -> Algorithm {
    match language.to_ascii_lowercase().as_str() {
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "spanish" => Algorithm::Spanish,
        "italian" => Algorithm::Italian,
        "portuguese" => Algorithm::Portuguese,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        other => {
            tracing::warn!(language = other, "No stemmer for language, using english");
            Algorithm::English
        }
    }
}

fn stopword_language(language: &str) -> LANGUAGE {
    match language.to_ascii_lowercase().as_str() {
        "french" => LANGUAGE::French,
        "german" => LANGUAGE::German,
        "spanish" => LANGUAGE::Spanish,
        "italian" => LANGUAGE::Italian,
        "portuguese" => LANGUAGE::Portuguese,
        "dutch" => LANGUAGE::Dutch,
        _ => LANGUAGE::English,
    }
}

/// Strip an English possessive suffix ("'s" with either apostrophe)
fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .or_else(|| word.strip_suffix("'S"))
        .unwrap_or(word)
}

/// Text analyzer: word segmentation, lowercasing, stopword removal and stemming
///
/// The same analyzer must be used to build an index and to normalize query
/// terms against it, otherwise lookups miss.
pub struct Analyzer {
    config: AnalyzerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Analyzer {
    /// Create a new analyzer from configuration
    pub fn new(config: &AnalyzerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(stemmer_algorithm(&config.language)))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(stopword_language(&config.language))
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze text into a vector of normalized terms, in text order
    pub fn analyze(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalize_word(word))
            .collect()
    }

    fn normalize_word(&self, word: &str) -> Option<String> {
        let word = strip_possessive(word);
        let token = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };

        let len = token.chars().count();
        if len < self.config.min_token_length
            || len > self.config.max_token_length
            || self.stopwords.contains(&token)
        {
            return None;
        }

        match &self.stemmer {
            Some(stemmer) => Some(stemmer.stem(&token).into_owned()),
            None => Some(token),
        }
    }

    /// Term frequencies of a text, sorted by term
    pub fn term_frequencies(&self, text: &str) -> BTreeMap<String, u32> {
        let mut freq = BTreeMap::new();
        for token in self.analyze(text) {
            *freq.entry(token).or_insert(0) += 1;
        }
        freq
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> AnalyzerConfig {
        AnalyzerConfig {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 2,
            max_token_length: 50,
            language: "english".to_string(),
        }
    }

    #[test]
    fn test_basic_analysis() {
        let analyzer = Analyzer::new(&plain());
        let tokens = analyzer.analyze("Hello World! This is a test.");

        assert_eq!(tokens, vec!["hello", "world", "this", "is", "test"]);
    }

    #[test]
    fn test_stopword_removal() {
        let config = AnalyzerConfig {
            remove_stopwords: true,
            ..plain()
        };

        let analyzer = Analyzer::new(&config);
        let tokens = analyzer.analyze("This is a document about the system");

        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
        assert!(tokens.contains(&"document".to_string()));
    }

    #[test]
    fn test_default_analyzer_stems_and_keeps_stopwords() {
        let analyzer = Analyzer::default();
        assert_eq!(analyzer.analyze("Running"), vec!["run"]);
        assert_eq!(analyzer.analyze("the"), vec!["the"]);
        assert_eq!(analyzer.analyze("Obama's"), vec!["obama"]);
        assert!(analyzer.analyze("  ... ").is_empty());
    }

    #[test]
    fn test_term_frequencies_sorted() {
        let analyzer = Analyzer::new(&plain());

        let freq = analyzer.term_frequencies("banana apple apple");
        let pairs: Vec<(&str, u32)> = freq.iter().map(|(t, f)| (t.as_str(), *f)).collect();
        assert_eq!(pairs, vec![("apple", 2), ("banana", 1)]);
    }

    #[test]
    fn test_min_max_token_length() {
        let config = AnalyzerConfig {
            min_token_length: 3,
            max_token_length: 5,
            ..plain()
        };

        let analyzer = Analyzer::new(&config);
        let tokens = analyzer.analyze("a ab abc abcd abcde abcdef");

        assert_eq!(tokens, vec!["abc", "abcd", "abcde"]);
    }
}
