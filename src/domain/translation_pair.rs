// ============================================================
// Layer 3 — TranslationPair Domain Type
// ============================================================
// One aligned sentence pair from a bilingual corpus, already
// resolved to the configured source and target languages.
//
// Example (en → it):
//   source: "I love you."
//   target: "Ti amo."

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    /// Sentence in the source language
    pub source: String,

    /// Reference translation in the target language
    pub target: String,
}

impl TranslationPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
