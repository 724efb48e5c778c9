// ============================================================
// Layer 5 — Inferencer (greedy decoding)
// ============================================================
// Translates one sentence at a time:
//
//   1. [SOS] source tokens [EOS] [PAD]...  → encoder, run once
//   2. decoder input starts as [SOS]
//   3. decode under a causal mask of the current length,
//      project the last position, append the argmax token
//   4. stop on [EOS] or when the output reaches max_len
//
// The same greedy loop logs sample translations during
// training, on the validation model.
//
// Reference: Vaswani et al. (2017) §6, greedy decoding

use std::sync::Arc;

use anyhow::Result;
use burn::{prelude::*, tensor::TensorData};

use crate::data::{dataset::SpecialTokens, mask::causal_mask_tensor};
use crate::domain::traits::{TextTokenizer, Translator};
use crate::error::{DatasetError, ModelError};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::transformer::Transformer;

fn ids_tensor<B: Backend>(ids: &[u32], device: &B::Device) -> Tensor<B, 2, Int> {
    let data: Vec<i64> = ids.iter().map(|&id| id as i64).collect();
    Tensor::from_data(TensorData::new(data, [1, ids.len()]), device)
}

/// Greedy decode a single source sequence.
///
/// `source` is `[1, src_len]` with its padding mask `[1, 1, 1, src_len]`.
/// Returns the decoder sequence starting with `[SOS]`, ending with
/// `[EOS]` unless `max_len` was reached first.
pub fn greedy_decode<B: Backend>(
    model:       &Transformer<B>,
    source:      Tensor<B, 2, Int>,
    source_mask: Tensor<B, 4, Bool>,
    special:     SpecialTokens,
    max_len:     usize,
    device:      &B::Device,
) -> Result<Vec<u32>, ModelError> {
    let encoder_output = model.encode(source, source_mask.clone())?;
    let mut decoded    = vec![special.sos];

    while decoded.len() < max_len {
        let len      = decoded.len();
        let tgt_mask = causal_mask_tensor::<B>(len, device).unsqueeze::<4>();

        let out = model.decode(
            encoder_output.clone(),
            source_mask.clone(),
            ids_tensor(&decoded, device),
            tgt_mask,
        )?;
        let d_model = out.dims()[2];
        let logits  = model.project(out.slice([0..1, len - 1..len, 0..d_model]));

        let next = logits.argmax(2).into_scalar().elem::<i64>() as u32;
        decoded.push(next);
        if next == special.eos {
            break;
        }
    }

    Ok(decoded)
}

/// `[SOS] tokens [EOS] [PAD]...` of length `seq_len`, plus its padding mask.
pub fn encoder_input(
    tokens:  &[u32],
    special: SpecialTokens,
    seq_len: usize,
) -> Result<(Vec<u32>, Vec<bool>), DatasetError> {
    if tokens.len() + 2 > seq_len {
        return Err(DatasetError::SentenceTooLong {
            index:         0,
            source_tokens: tokens.len(),
            target_tokens: 0,
            seq_len,
        });
    }

    let mut ids = Vec::with_capacity(seq_len);
    ids.push(special.sos);
    ids.extend_from_slice(tokens);
    ids.push(special.eos);
    let real = ids.len();
    ids.resize(seq_len, special.pad);

    let mask = (0..seq_len).map(|i| i < real).collect();
    Ok((ids, mask))
}

/// A trained model plus the tokenizers it was trained with.
pub struct Inferencer<B: Backend> {
    model:         Transformer<B>,
    tokenizer_src: Arc<dyn TextTokenizer>,
    tokenizer_tgt: Arc<dyn TextTokenizer>,
    special:       SpecialTokens,
    seq_len:       usize,
    device:        B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:         Transformer<B>,
        tokenizer_src: Arc<dyn TextTokenizer>,
        tokenizer_tgt: Arc<dyn TextTokenizer>,
        seq_len:       usize,
        device:        B::Device,
    ) -> Result<Self> {
        let special = SpecialTokens::from_tokenizer(tokenizer_tgt.as_ref())?;
        Ok(Self { model, tokenizer_src, tokenizer_tgt, special, seq_len, device })
    }

    /// Rebuild the architecture from the saved TrainConfig and load
    /// the weights of `epoch`. Dropout is disabled.
    pub fn from_checkpoint(
        ckpt_manager:  &CheckpointManager,
        epoch:         usize,
        tokenizer_src: Arc<dyn TextTokenizer>,
        tokenizer_tgt: Arc<dyn TextTokenizer>,
        device:        B::Device,
    ) -> Result<Self> {
        let cfg = ckpt_manager.load_config()?;
        let model_cfg = cfg
            .model_config(tokenizer_src.vocab_len(), tokenizer_tgt.vocab_len())
            .with_dropout(0.0);

        let model: Transformer<B> = model_cfg.init(&device)?;
        let model = ckpt_manager.load_model(model, epoch, &device)?;
        tracing::info!("Model loaded from checkpoint (epoch {})", epoch);

        Self::new(model, tokenizer_src, tokenizer_tgt, cfg.seq_len, device)
    }

    /// Greedy output ids for `text`, `[SOS]` first.
    pub fn translate_ids(&self, text: &str) -> Result<Vec<u32>> {
        let tokens = self.tokenizer_src.encode_ids(text)?;
        let (ids, mask) = encoder_input(&tokens, self.special, self.seq_len)?;

        let source      = ids_tensor::<B>(&ids, &self.device);
        let source_mask = Tensor::<B, 4, Bool>::from_data(
            TensorData::new(mask, [1, 1, 1, self.seq_len]),
            &self.device,
        );

        let output = greedy_decode(
            &self.model,
            source,
            source_mask,
            self.special,
            self.seq_len,
            &self.device,
        )?;
        tracing::debug!("Greedy decode of '{}' produced {} tokens", text, output.len());
        Ok(output)
    }
}

impl<B: Backend> Translator for Inferencer<B> {
    fn translate(&self, text: &str) -> Result<String> {
        let ids = self.translate_ids(text)?;
        self.tokenizer_tgt.decode_ids(&ids)
    }
}
