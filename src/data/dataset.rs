// ============================================================
// Layer 4 — Bilingual Dataset Adapter
// ============================================================
// Turns raw sentence pairs into fixed-length training examples,
// lazily, one index at a time:
//
//   encoder_input: [SOS] src tokens [EOS] [PAD]...   (seq_len)
//   decoder_input: [SOS] tgt tokens [PAD]...         (seq_len)
//   label:               tgt tokens [EOS] [PAD]...   (seq_len)
//
//   encoder_mask: non-pad positions of encoder_input
//   decoder_mask: non-pad positions of decoder_input AND causal
//
// A pair whose tokens plus markers do not fit in seq_len is an
// error; nothing is truncated here.
//
// Tokenizers are shared read-only (Arc), so the data loader may
// call `get` from several worker threads at once.

use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::mask::decoder_mask;
use crate::domain::traits::{TextTokenizer, EOS_TOKEN, PAD_TOKEN, SOS_TOKEN};
use crate::domain::translation_pair::TranslationPair;
use crate::error::DatasetError;

/// One fully tokenised and padded example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BilingualItem {
    pub source_text:   String,
    pub target_text:   String,
    pub encoder_input: Vec<u32>,
    pub decoder_input: Vec<u32>,
    pub label:         Vec<u32>,
    /// `[seq_len]`, true for non-pad encoder positions
    pub encoder_mask:  Vec<bool>,
    /// Row-major `[seq_len, seq_len]`, true where query i may attend key j
    pub decoder_mask:  Vec<bool>,
}

impl BilingualItem {
    pub fn seq_len(&self) -> usize {
        self.encoder_input.len()
    }

    pub fn decoder_allows(&self, query: usize, key: usize) -> bool {
        self.decoder_mask[query * self.seq_len() + key]
    }
}

/// Ids of the markers wrapped around every sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub sos: u32,
    pub eos: u32,
    pub pad: u32,
}

impl SpecialTokens {
    pub fn from_tokenizer<T: TextTokenizer + ?Sized>(tokenizer: &T) -> Result<Self, DatasetError> {
        let id = |token: &str| {
            tokenizer
                .special_token_id(token)
                .ok_or_else(|| DatasetError::MissingSpecialToken(token.to_string()))
        };
        Ok(Self {
            sos: id(SOS_TOKEN)?,
            eos: id(EOS_TOKEN)?,
            pad: id(PAD_TOKEN)?,
        })
    }
}

pub struct BilingualDataset<S, T> {
    pairs:         Vec<TranslationPair>,
    tokenizer_src: Arc<S>,
    tokenizer_tgt: Arc<T>,
    special:       SpecialTokens,
    seq_len:       usize,
}

impl<S: TextTokenizer, T: TextTokenizer> BilingualDataset<S, T> {
    /// Special-token ids are taken from the target tokenizer, as both
    /// tokenizers are built with the same special-token layout.
    pub fn new(
        pairs:         Vec<TranslationPair>,
        tokenizer_src: Arc<S>,
        tokenizer_tgt: Arc<T>,
        seq_len:       usize,
    ) -> Result<Self, DatasetError> {
        let special = SpecialTokens::from_tokenizer(tokenizer_tgt.as_ref())?;
        Ok(Self { pairs, tokenizer_src, tokenizer_tgt, special, seq_len })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    pub fn tokenizer_src(&self) -> &Arc<S> {
        &self.tokenizer_src
    }

    pub fn tokenizer_tgt(&self) -> &Arc<T> {
        &self.tokenizer_tgt
    }

    /// Build the example at `index`.
    pub fn item(&self, index: usize) -> Result<BilingualItem, DatasetError> {
        let pair = self.pairs.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.pairs.len(),
        })?;

        let src_tokens = self
            .tokenizer_src
            .encode_ids(&pair.source)
            .map_err(|e| DatasetError::Tokenize(e.to_string()))?;
        let tgt_tokens = self
            .tokenizer_tgt
            .encode_ids(&pair.target)
            .map_err(|e| DatasetError::Tokenize(e.to_string()))?;

        // SOS + EOS on the encoder side; SOS on decoder input, EOS on label
        let enc_padding = self.seq_len as i64 - src_tokens.len() as i64 - 2;
        let dec_padding = self.seq_len as i64 - tgt_tokens.len() as i64 - 1;
        if enc_padding < 0 || dec_padding < 0 {
            return Err(DatasetError::SentenceTooLong {
                index,
                source_tokens: src_tokens.len(),
                target_tokens: tgt_tokens.len(),
                seq_len:       self.seq_len,
            });
        }
        let (enc_padding, dec_padding) = (enc_padding as usize, dec_padding as usize);
        let SpecialTokens { sos, eos, pad } = self.special;

        let mut encoder_input = Vec::with_capacity(self.seq_len);
        encoder_input.push(sos);
        encoder_input.extend_from_slice(&src_tokens);
        encoder_input.push(eos);
        encoder_input.extend(std::iter::repeat(pad).take(enc_padding));

        let mut decoder_input = Vec::with_capacity(self.seq_len);
        decoder_input.push(sos);
        decoder_input.extend_from_slice(&tgt_tokens);
        decoder_input.extend(std::iter::repeat(pad).take(dec_padding));

        let mut label = Vec::with_capacity(self.seq_len);
        label.extend_from_slice(&tgt_tokens);
        label.push(eos);
        label.extend(std::iter::repeat(pad).take(dec_padding));

        debug_assert_eq!(encoder_input.len(), self.seq_len);
        debug_assert_eq!(decoder_input.len(), self.seq_len);
        debug_assert_eq!(label.len(), self.seq_len);

        let encoder_mask: Vec<bool> = encoder_input.iter().map(|&id| id != pad).collect();
        let decoder_nonpad: Vec<bool> = decoder_input.iter().map(|&id| id != pad).collect();

        Ok(BilingualItem {
            source_text: pair.source.clone(),
            target_text: pair.target.clone(),
            encoder_input,
            decoder_input,
            label,
            encoder_mask,
            decoder_mask: decoder_mask(&decoder_nonpad),
        })
    }
}

/// Burn's data loader only sees fully built examples. Indices that fail
/// are logged and reported as absent, so callers should drop overlong
/// pairs before handing the dataset to a loader
/// (`train_use_case::keep_fitting_pairs`).
impl<S: TextTokenizer, T: TextTokenizer> Dataset<BilingualItem> for BilingualDataset<S, T> {
    fn get(&self, index: usize) -> Option<BilingualItem> {
        match self.item(index) {
            Ok(item) => Some(item),
            Err(DatasetError::IndexOutOfRange { .. }) => None,
            Err(e) => {
                tracing::error!("Cannot build example {}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}
