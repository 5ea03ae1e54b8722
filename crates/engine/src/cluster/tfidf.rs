//! Bounded-vocabulary TF-IDF vectorization
//!
//! Lowercase alphanumeric tokens, english stop words removed, unigrams and
//! bigrams, vocabulary capped by corpus frequency. Rows are L2-normalized
//! so cosine similarity reduces to a dot product.

use regex_lite::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Vocabulary cap matching the bounded-vocabulary contract
pub const DEFAULT_MAX_FEATURES: usize = 500;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at",
    "based", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "here", "how", "if", "in",
    "into", "is", "it", "its", "itself", "just", "more", "most", "new", "no", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same",
    "should", "show", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "under", "until", "up",
    "use", "used", "using", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Term vectors over a fixed vocabulary, row-aligned to the input order.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Alphabetically ordered vocabulary
    pub vocabulary: Vec<String>,

    /// One L2-normalized row per document
    pub vectors: Vec<Vec<f64>>,
}

impl TfidfMatrix {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// TF-IDF vectorizer with a bounded vocabulary.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    pub max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Fit the vocabulary on `documents` and return their vectors.
    pub fn fit_transform(&self, documents: &[String]) -> TfidfMatrix {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| ngrams(d)).collect();

        let mut corpus_counts: HashMap<String, usize> = HashMap::new();
        let mut document_freq: HashMap<String, usize> = HashMap::new();
        for terms in &tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in terms {
                *corpus_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term) {
                    *document_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        // Keep the most frequent terms, ties alphabetical for determinism
        let mut ranked: Vec<(String, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);
        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        // Smooth idf: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = document_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vectors = tokenized
            .iter()
            .map(|terms| {
                let mut vector = vec![0.0; vocabulary.len()];
                for term in terms {
                    if let Some(&i) = index.get(term.as_str()) {
                        vector[i] += 1.0;
                    }
                }
                for (i, value) in vector.iter_mut().enumerate() {
                    *value *= idf[i];
                }
                let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for value in &mut vector {
                        *value /= norm;
                    }
                }
                vector
            })
            .collect();

        TfidfMatrix {
            vocabulary,
            vectors,
        }
    }
}

/// Unigrams plus bigrams over the stop-word-filtered token stream.
fn ngrams(text: &str) -> Vec<String> {
    let tokens = tokens(text);
    let mut terms = tokens.clone();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

fn tokens(text: &str) -> Vec<String> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let pattern = TOKEN.get_or_init(|| Regex::new(r"[a-z0-9]+").unwrap());

    let lowered = text.to_lowercase();
    pattern
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() >= 2 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}
