//! Word-level tokenizer feeding the ranking model's text branch.
//!
//! ## Algorithm
//! 1. Lowercase the text and replace punctuation, tabs and newlines with spaces
//! 2. Split on whitespace
//! 3. Rank words by corpus frequency (descending, ties lexicographic)
//! 4. Assign ids from 2 upwards; 0 is padding, 1 is the out-of-vocabulary id
//! 5. Only ids below `max_words` survive; every other word maps to 1
//!
//! Sequences are right-padded with 0 / right-truncated to a fixed length.

use std::collections::HashMap;

/// Padding id used to fill short sequences
pub const PAD_ID: u32 = 0;

/// Id for words outside the retained vocabulary
pub const OOV_ID: u32 = 1;

/// Characters stripped before splitting
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n\r";

#[derive(Debug, Clone, PartialEq)]
pub struct TextTokenizer {
    /// word -> id, only words with id < max_words
    word_index: HashMap<String, u32>,
    max_words: usize,
}

impl TextTokenizer {
    /// Fit the vocabulary on a corpus of documents
    pub fn fit<S: AsRef<str>>(documents: &[S], max_words: usize) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            for word in split_words(doc.as_ref()) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // Ids 0 and 1 are reserved, so at most max_words - 2 real words fit
        let capacity = max_words.saturating_sub(2);
        let word_index = ranked
            .into_iter()
            .take(capacity)
            .enumerate()
            .map(|(rank, (word, _))| (word, rank as u32 + 2))
            .collect();

        Self {
            word_index,
            max_words,
        }
    }

    /// Size of the id space (padding + OOV + retained words).
    ///
    /// The embedding table of the ranking model needs exactly this many rows.
    pub fn vocab_size(&self) -> usize {
        self.word_index.len() + 2
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Id of a single word, `OOV_ID` if it wasn't retained
    pub fn word_id(&self, word: &str) -> u32 {
        self.word_index.get(word).copied().unwrap_or(OOV_ID)
    }

    /// Unpadded id sequence for a text
    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        split_words(text)
            .iter()
            .map(|w| self.word_id(w))
            .collect()
    }

    /// Fixed-length id sequence: truncated from the end, padded at the end
    pub fn encode_padded(&self, text: &str, length: usize) -> Vec<u32> {
        let mut sequence = self.text_to_sequence(text);
        sequence.truncate(length);
        sequence.resize(length, PAD_ID);
        sequence
    }
}

/// Lowercase, strip punctuation, split on whitespace
fn split_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_ranking_with_lexicographic_ties() {
        let tokenizer = TextTokenizer::fit(&["the cat", "the dog", "a cat"], 100);
        // "cat" and "the" both occur twice -> lexicographic: cat, the
        assert_eq!(tokenizer.word_id("cat"), 2);
        assert_eq!(tokenizer.word_id("the"), 3);
        // "a" and "dog" occur once
        assert_eq!(tokenizer.word_id("a"), 4);
        assert_eq!(tokenizer.word_id("dog"), 5);
        assert_eq!(tokenizer.vocab_size(), 6);
    }

    #[test]
    fn test_punctuation_and_case_are_normalized() {
        let tokenizer = TextTokenizer::fit(&["Hello, World!"], 100);
        assert_eq!(
            tokenizer.text_to_sequence("HELLO world."),
            tokenizer.text_to_sequence("hello world")
        );
        assert_eq!(tokenizer.word_id("hello"), 2);
    }

    #[test]
    fn test_max_words_caps_vocabulary() {
        let tokenizer = TextTokenizer::fit(&["a a a b b c"], 4);
        // Only ids 2 and 3 fit below max_words = 4
        assert_eq!(tokenizer.word_id("a"), 2);
        assert_eq!(tokenizer.word_id("b"), 3);
        assert_eq!(tokenizer.word_id("c"), OOV_ID);
        assert_eq!(tokenizer.vocab_size(), 4);
    }

    #[test]
    fn test_padding_and_truncation() {
        let tokenizer = TextTokenizer::fit(&["one two three four"], 100);

        let padded = tokenizer.encode_padded("one two", 4);
        assert_eq!(padded.len(), 4);
        assert_eq!(&padded[2..], &[PAD_ID, PAD_ID]);

        let truncated = tokenizer.encode_padded("one two three four", 2);
        assert_eq!(truncated, vec![tokenizer.word_id("one"), tokenizer.word_id("two")]);

        let unknown = tokenizer.encode_padded("zebra", 3);
        assert_eq!(unknown, vec![OOV_ID, PAD_ID, PAD_ID]);
    }
}
