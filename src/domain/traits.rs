// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset adapter and the translation workflow only ever
// see these traits:
//   - PairSource     → anything that yields sentence pairs
//   - TextTokenizer  → the tokenizer contract (encode, special
//                      token lookup, decode, vocabulary size)
//   - Translator     → anything that turns a sentence into
//                      its translation
//
// The HuggingFace tokenizer implements TextTokenizer in the
// infra layer; tests plug in a tiny whitespace tokenizer.

use anyhow::Result;
use crate::domain::translation_pair::TranslationPair;

/// Start-of-sequence marker.
pub const SOS_TOKEN: &str = "[SOS]";
/// End-of-sequence marker.
pub const EOS_TOKEN: &str = "[EOS]";
/// Filler used to reach the fixed sequence length.
pub const PAD_TOKEN: &str = "[PAD]";
/// Out-of-vocabulary placeholder.
pub const UNK_TOKEN: &str = "[UNK]";

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Any component that can load aligned sentence pairs.
pub trait PairSource {
    fn load_pairs(&self) -> Result<Vec<TranslationPair>>;
}

// ─── TextTokenizer ────────────────────────────────────────────────────────────
/// Tokenizer contract consumed by the dataset adapter and greedy decoding.
///
/// Implementations are shared read-only across data-loading workers,
/// hence the `Send + Sync` bound.
pub trait TextTokenizer: Send + Sync {
    /// Token ids for `text`, without any special markers.
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>>;

    /// Id of a special token such as `[SOS]`, if the vocabulary has it.
    fn special_token_id(&self, token: &str) -> Option<u32>;

    /// Text for `ids`, skipping special tokens.
    fn decode_ids(&self, ids: &[u32]) -> Result<String>;

    fn vocab_len(&self) -> usize;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that can translate a source sentence.
pub trait Translator {
    fn translate(&self, sentence: &str) -> Result<String>;
}
