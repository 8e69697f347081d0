//! Text-pair feature extraction
//!
//! Turns a (sentence1, sentence2) pair into a fixed-width vector of lexical
//! similarity statistics. Every feature is finite for every input, including
//! empty strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Feature vector for one text pair
pub type FeatureVector = Vec<f64>;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; 13] = [
    "token_jaccard",
    "token_overlap_min",
    "token_overlap_max",
    "char_bigram_dice",
    "char_trigram_jaccard",
    "levenshtein_similarity",
    "common_prefix_ratio",
    "char_length_ratio",
    "token_count_diff",
    "exact_match",
    "substring_match",
    "token_count_first",
    "token_count_second",
];

/// Width of every feature vector
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Compare texts case-insensitively
    pub lowercase: bool,
    /// Texts are truncated to this many chars before edit distance
    pub max_edit_chars: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            max_edit_chars: 256,
        }
    }
}

/// Collapse whitespace runs and optionally lowercase
pub fn normalize_text(text: &str, config: &FeatureConfig) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if config.lowercase {
        collapsed.to_lowercase()
    } else {
        collapsed
    }
}

/// Split normalized text into alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Character n-grams; texts shorter than `n` yield themselves as one gram
pub fn char_ngrams(text: &str, n: usize) -> BTreeSet<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return BTreeSet::new();
    }
    if chars.len() < n {
        return BTreeSet::from([text.to_string()]);
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// |A ∩ B| / |A ∪ B|, 1.0 when both sets are empty
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// 2|A ∩ B| / (|A| + |B|), 1.0 when both sets are empty
pub fn dice<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * a.intersection(b).count() as f64 / total as f64
}

/// Levenshtein distance over chars, two-row dynamic programming
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn overlap_ratio(intersection: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        intersection as f64 / denominator as f64
    }
}

/// Extract the feature vector for one text pair.
///
/// Order follows [`FEATURE_NAMES`].
pub fn extract_features(first: &str, second: &str, config: &FeatureConfig) -> FeatureVector {
    let a = normalize_text(first, config);
    let b = normalize_text(second, config);

    let tokens_a = tokenize(&a);
    let tokens_b = tokenize(&b);
    let set_a: BTreeSet<&str> = tokens_a.iter().copied().collect();
    let set_b: BTreeSet<&str> = tokens_b.iter().copied().collect();
    let shared = set_a.intersection(&set_b).count();

    let chars_a: Vec<char> = a.chars().take(config.max_edit_chars).collect();
    let chars_b: Vec<char> = b.chars().take(config.max_edit_chars).collect();
    let longest = chars_a.len().max(chars_b.len());
    let edit_similarity = if longest == 0 {
        1.0
    } else {
        1.0 - levenshtein(&chars_a, &chars_b) as f64 / longest as f64
    };

    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);

    let contained = !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a));

    vec![
        jaccard(&set_a, &set_b),
        overlap_ratio(shared, set_a.len().min(set_b.len())),
        overlap_ratio(shared, set_a.len().max(set_b.len())),
        dice(&char_ngrams(&a, 2), &char_ngrams(&b, 2)),
        jaccard(&char_ngrams(&a, 3), &char_ngrams(&b, 3)),
        edit_similarity,
        overlap_ratio(prefix, max_len),
        overlap_ratio(len_a.min(len_b), max_len),
        tokens_a.len().abs_diff(tokens_b.len()) as f64,
        if a == b { 1.0 } else { 0.0 },
        if contained { 1.0 } else { 0.0 },
        tokens_a.len() as f64,
        tokens_b.len() as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(vector: &[f64], name: &str) -> f64 {
        let idx = FEATURE_NAMES.iter().position(|n| *n == name).unwrap();
        vector[idx]
    }

    #[test]
    fn test_vector_width() {
        let v = extract_features("abatement", "abatement of pollution", &FeatureConfig::default());
        assert_eq!(v.len(), FEATURE_COUNT);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_identical_texts() {
        let v = extract_features("Hot Water", "hot  water", &FeatureConfig::default());
        assert_eq!(feature(&v, "token_jaccard"), 1.0);
        assert_eq!(feature(&v, "levenshtein_similarity"), 1.0);
        assert_eq!(feature(&v, "exact_match"), 1.0);
        assert_eq!(feature(&v, "token_count_diff"), 0.0);
    }

    #[test]
    fn test_case_sensitive_config() {
        let config = FeatureConfig {
            lowercase: false,
            ..FeatureConfig::default()
        };
        let v = extract_features("Water", "water", &config);
        assert_eq!(feature(&v, "exact_match"), 0.0);
    }

    #[test]
    fn test_disjoint_texts() {
        let v = extract_features("abc", "xyz", &FeatureConfig::default());
        assert_eq!(feature(&v, "token_jaccard"), 0.0);
        assert_eq!(feature(&v, "char_bigram_dice"), 0.0);
        assert_eq!(feature(&v, "levenshtein_similarity"), 0.0);
        assert_eq!(feature(&v, "substring_match"), 0.0);
    }

    #[test]
    fn test_substring_and_overlap() {
        let v = extract_features("wet", "wet process", &FeatureConfig::default());
        assert_eq!(feature(&v, "substring_match"), 1.0);
        assert_eq!(feature(&v, "token_overlap_min"), 1.0);
        assert_eq!(feature(&v, "token_overlap_max"), 0.5);
        assert_eq!(feature(&v, "token_count_first"), 1.0);
        assert_eq!(feature(&v, "token_count_second"), 2.0);
    }

    #[test]
    fn test_empty_texts_are_finite() {
        let v = extract_features("", "", &FeatureConfig::default());
        assert!(v.iter().all(|x| x.is_finite()));

        let v = extract_features("", "something", &FeatureConfig::default());
        assert!(v.iter().all(|x| x.is_finite()));
        assert_eq!(feature(&v, "substring_match"), 0.0);
    }

    #[test]
    fn test_levenshtein() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&a, &b), 3);
        assert_eq!(levenshtein(&a, &[]), 6);
    }

    #[test]
    fn test_short_text_ngrams() {
        let grams = char_ngrams("a", 3);
        assert_eq!(grams.len(), 1);
        assert!(char_ngrams("", 2).is_empty());
    }
}
