// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Manages one word-level tokenizer per language:
//
//   {dir}/tokenizer_en.json
//   {dir}/tokenizer_it.json
//
// A tokenizer is built from the corpus sentences the first time
// a language is seen and loaded from disk on every later run, so
// training and inference share the same vocabulary.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. The vocabulary is therefore counted
// here and the tokenizer JSON written directly, then loaded back
// with Tokenizer::from_file.
//
// Vocabulary layout:
//   [UNK]=0  [PAD]=1  [SOS]=2  [EOS]=3  then words by frequency
//
// Reference: HuggingFace tokenizers (WordLevel model)

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};
use tokenizers::Tokenizer;

use crate::domain::traits::{TextTokenizer, EOS_TOKEN, PAD_TOKEN, SOS_TOKEN, UNK_TOKEN};

/// Special tokens in id order
pub const SPECIAL_TOKENS: [&str; 4] = [UNK_TOKEN, PAD_TOKEN, SOS_TOKEN, EOS_TOKEN];

pub struct TokenizerStore {
    dir:           PathBuf,
    min_frequency: usize,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>, min_frequency: usize) -> Self {
        Self { dir: dir.into(), min_frequency }
    }

    pub fn path_for(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("tokenizer_{lang}.json"))
    }

    /// Load the tokenizer for `lang`, or build it from `sentences`
    pub fn load_or_build<'a>(
        &self,
        lang:      &str,
        sentences: impl IntoIterator<Item = &'a str>,
    ) -> Result<Tokenizer> {
        if self.path_for(lang).exists() {
            tracing::info!("Loading existing '{}' tokenizer from disk", lang);
            self.load(lang)
        } else {
            tracing::info!(
                "Building new '{}' tokenizer (min_frequency={})",
                lang,
                self.min_frequency
            );
            self.build_and_save(lang, sentences)
        }
    }

    pub fn load(&self, lang: &str) -> Result<Tokenizer> {
        let path = self.path_for(lang);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_and_save<'a>(
        &self,
        lang:      &str,
        sentences: impl IntoIterator<Item = &'a str>,
    ) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let words = build_vocab(sentences, self.min_frequency);

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for word in &words {
            let id = vocab.len();
            vocab.entry(word.clone()).or_insert_with(|| serde_json::json!(id));
        }
        let vocab_len = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // HuggingFace format, as read by Tokenizer::from_file()
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path_for(lang);
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON '{}'", path.display()))?;

        tracing::info!(
            "Tokenizer '{}' built with {} tokens, saved to '{}'",
            lang,
            vocab_len,
            path.display()
        );

        self.load(lang)
    }
}

/// Count words and keep those seen at least `min_frequency` times,
/// most frequent first (ties broken alphabetically).
pub fn build_vocab<'a>(
    sentences:     impl IntoIterator<Item = &'a str>,
    min_frequency: usize,
) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for sentence in sentences {
        for word in pre_tokenize(sentence) {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(&str, usize)> = freq
        .into_iter()
        .filter(|(word, count)| *count >= min_frequency && !SPECIAL_TOKENS.contains(word))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.into_iter().map(|(w, _)| w.to_string()).collect()
}

/// Same segmentation as the `Whitespace` pre-tokenizer: runs of word
/// characters, and runs of punctuation, split on whitespace.
pub fn pre_tokenize(text: &str) -> Vec<&str> {
    #[derive(PartialEq, Clone, Copy)]
    enum Class { Word, Punct, Space }

    let class = |c: char| {
        if c.is_whitespace() {
            Class::Space
        } else if c.is_alphanumeric() || c == '_' {
            Class::Word
        } else {
            Class::Punct
        }
    };

    let mut pieces = Vec::new();
    let mut start: Option<(usize, Class)> = None;

    for (i, c) in text.char_indices() {
        let current = class(c);
        match start {
            Some((_, run)) if run == current => {}
            Some((s, _)) => {
                pieces.push(&text[s..i]);
                start = (current != Class::Space).then_some((i, current));
            }
            None => start = (current != Class::Space).then_some((i, current)),
        }
    }
    if let Some((s, _)) = start {
        pieces.push(&text[s..]);
    }
    pieces
}

impl TextTokenizer for Tokenizer {
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Cannot encode '{}': {}", text, e))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn special_token_id(&self, token: &str) -> Option<u32> {
        self.token_to_id(token)
    }

    fn decode_ids(&self, ids: &[u32]) -> Result<String> {
        self.decode(ids, true)
            .map_err(|e| anyhow::anyhow!("Cannot decode ids: {e}"))
    }

    // Special tokens are part of the WordLevel vocabulary itself
    fn vocab_len(&self) -> usize {
        self.get_vocab_size(false)
    }
}
