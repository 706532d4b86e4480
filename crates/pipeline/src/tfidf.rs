//! TF-IDF vectors over movie overviews, used only for content similarity.
//!
//! Tokenizes text into lowercase runs of two or more word characters, drops
//! English stop words, keeps the most frequent terms, and weights each term by
//! raw count x smoothed IDF. Rows are L2-normalised so cosine similarity is a
//! plain dot product.

use std::collections::{BTreeMap, HashMap, HashSet};

/// English stop words, the 318-word list scikit-learn ships as
/// `ENGLISH_STOP_WORDS`
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "amoungst",
    "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere",
    "are", "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con",
    "could", "couldnt", "cry", "de", "describe", "detail", "do", "done", "down", "due", "during",
    "each", "eg", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc",
    "even", "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found",
    "four", "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt", "have",
    "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself",
    "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed",
    "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least",
    "less", "ltd", "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more",
    "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely",
    "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor",
    "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seeming",
    "seems", "serious", "several", "she", "should", "show", "side", "since", "sincere", "six",
    "sixty", "so", "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
    "still", "such", "system", "take", "ten", "than", "that", "the", "their", "them", "themselves",
    "then", "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon",
    "these", "they", "thick", "thin", "third", "this", "those", "though", "three", "through",
    "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve",
    "twenty", "two", "un", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well",
    "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
    "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Sparse row: sorted column indices with their weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut acc) = (0, 0, 0.0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

}

/// Row-major collection of sparse vectors sharing one column space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrix {
    pub rows: Vec<SparseVector>,
    pub n_cols: usize,
}

impl SparseMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVectorizer {
    /// term -> column, columns in lexicographic term order
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights on a corpus.
    ///
    /// At most `max_features` terms are kept, chosen by total corpus count
    /// (ties lexicographic).
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen = HashSet::new();
            for token in tokens {
                *term_counts.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        kept.sort_unstable();

        let n = documents.len() as f32;
        let idf = kept
            .iter()
            .map(|t| {
                let df = *doc_freq.get(t).unwrap_or(&0) as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        Self { vocabulary, idf }
    }

    /// Number of columns
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// L2-normalised TF-IDF row for one text
    pub fn transform(&self, text: &str) -> SparseVector {
        // BTreeMap keeps columns sorted for the SparseVector invariant
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(col) = self.column(&token) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut row = SparseVector {
            indices: Vec::with_capacity(counts.len()),
            values: Vec::with_capacity(counts.len()),
        };
        for (col, count) in counts {
            row.indices.push(col);
            row.values.push(count * self.idf[col]);
        }

        let norm = row.norm();
        if norm > 0.0 {
            for v in &mut row.values {
                *v /= norm;
            }
        }
        row
    }

    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> SparseMatrix {
        SparseMatrix {
            rows: documents.iter().map(|d| self.transform(d.as_ref())).collect(),
            n_cols: self.n_features(),
        }
    }
}

/// Lowercase runs of 2+ word characters, stop words removed
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        assert_eq!(tokenize("A story about the Mob, in 1972!"), vec!["story", "mob", "1972"]);
        assert!(tokenize("another one").is_empty());
    }

    #[test]
    fn test_common_overview_words_get_no_column() {
        let tfidf = TfidfVectorizer::fit(
            &["Two men find the first clue", "Three friends take part in the show"],
            100,
        );
        for word in ["two", "find", "first", "three", "take", "part", "show"] {
            assert!(tfidf.column(word).is_none(), "{} kept as a term", word);
        }
        assert!(tfidf.column("clue").is_some());
        assert!(tfidf.column("friends").is_some());
        assert_eq!(STOP_WORDS.len(), 318);
    }

    #[test]
    fn test_columns_are_lexicographic() {
        let tfidf = TfidfVectorizer::fit(&["zebra apple", "mango"], 100);
        assert_eq!(tfidf.column("apple"), Some(0));
        assert_eq!(tfidf.column("mango"), Some(1));
        assert_eq!(tfidf.column("zebra"), Some(2));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let tfidf = TfidfVectorizer::fit(&["heist heist heist", "heist crew", "crew vault"], 2);
        assert_eq!(tfidf.n_features(), 2);
        assert!(tfidf.column("heist").is_some());
        assert!(tfidf.column("crew").is_some());
        assert!(tfidf.column("vault").is_none());
    }

    #[test]
    fn test_rows_are_unit_length() {
        let tfidf = TfidfVectorizer::fit(&["war soldier war", "soldier home"], 100);
        let row = tfidf.transform("war soldier war");
        assert!((row.norm() - 1.0).abs() < 1e-5);

        // Rarer term gets the higher idf
        let home = tfidf.column("home").unwrap();
        let soldier = tfidf.column("soldier").unwrap();
        assert!(tfidf.idf[home] > tfidf.idf[soldier]);
    }

    #[test]
    fn test_unknown_text_is_empty_row() {
        let tfidf = TfidfVectorizer::fit(&["space station"], 100);
        let row = tfidf.transform("the and of");
        assert_eq!(row.nnz(), 0);
        assert_eq!(row.norm(), 0.0);
    }

    #[test]
    fn test_sparse_dot() {
        let a = SparseVector { indices: vec![0, 2, 5], values: vec![1.0, 2.0, 3.0] };
        let b = SparseVector { indices: vec![2, 3, 5], values: vec![4.0, 1.0, 0.5] };
        assert_eq!(a.dot(&b), 2.0 * 4.0 + 3.0 * 0.5);
    }
}
