// Test-only whitespace tokenizer with the same special-token layout as
// the word-level tokenizers built by `infra::tokenizer_store`.

use std::collections::HashMap;

use anyhow::Result;

use crate::domain::traits::{TextTokenizer, EOS_TOKEN, PAD_TOKEN, SOS_TOKEN, UNK_TOKEN};

pub struct WordTokenizer {
    vocab:   HashMap<String, u32>,
    reverse: Vec<String>,
}

impl WordTokenizer {
    /// `[UNK]`=0, `[PAD]`=1, `[SOS]`=2, `[EOS]`=3, then words by first appearance.
    pub fn from_corpus<'a>(sentences: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokenizer = Self::without_specials([UNK_TOKEN, PAD_TOKEN, SOS_TOKEN, EOS_TOKEN]);
        for sentence in sentences {
            for word in sentence.split_whitespace() {
                tokenizer.push(word);
            }
        }
        tokenizer
    }

    pub fn without_specials<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokenizer = Self { vocab: HashMap::new(), reverse: Vec::new() };
        for word in words {
            tokenizer.push(word);
        }
        tokenizer
    }

    fn push(&mut self, word: &str) {
        if !self.vocab.contains_key(word) {
            self.vocab.insert(word.to_string(), self.reverse.len() as u32);
            self.reverse.push(word.to_string());
        }
    }
}

impl TextTokenizer for WordTokenizer {
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text
            .split_whitespace()
            .map(|w| self.vocab.get(w).copied().unwrap_or(0))
            .collect())
    }

    fn special_token_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    fn decode_ids(&self, ids: &[u32]) -> Result<String> {
        Ok(ids
            .iter()
            .filter_map(|&id| self.reverse.get(id as usize))
            .filter(|w| !w.starts_with('['))
            .cloned()
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn vocab_len(&self) -> usize {
        self.reverse.len()
    }
}
