// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to stack BilingualItems into
// the tensors the Transformer consumes.
//
//   Input:  Vec of N BilingualItems, each padded to seq_len S
//   Output: TranslationBatch
//             encoder_input  [N, S]        Int
//             decoder_input  [N, S]        Int
//             label          [N, S]        Int
//             encoder_mask   [N, 1, 1, S]  Bool
//             decoder_mask   [N, 1, S, S]  Bool
//
// Every item is already padded to the same length by the
// dataset adapter, so batching is flatten + reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::BilingualItem;

#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    pub encoder_input: Tensor<B, 2, Int>,
    pub decoder_input: Tensor<B, 2, Int>,
    pub label:         Tensor<B, 2, Int>,
    pub encoder_mask:  Tensor<B, 4, Bool>,
    pub decoder_mask:  Tensor<B, 4, Bool>,
    /// Raw sentences, kept for logging sample translations
    pub source_texts:  Vec<String>,
    pub target_texts:  Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TranslationBatcher;

impl TranslationBatcher {
    pub fn new() -> Self {
        Self
    }
}

fn ids_tensor<B: Backend>(
    items:   &[BilingualItem],
    field:   impl Fn(&BilingualItem) -> &[u32],
    seq_len: usize,
    device:  &B::Device,
) -> Tensor<B, 2, Int> {
    // Burn Int tensors are built from i64 data and converted by the backend
    let flat: Vec<i64> = items
        .iter()
        .flat_map(|item| field(item).iter().map(|&id| id as i64))
        .collect();
    Tensor::from_data(TensorData::new(flat, [items.len(), seq_len]), device)
}

impl<B: Backend> Batcher<B, BilingualItem, TranslationBatch<B>> for TranslationBatcher {
    fn batch(&self, items: Vec<BilingualItem>, device: &B::Device) -> TranslationBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(BilingualItem::seq_len).unwrap_or(0);

        let encoder_input = ids_tensor(&items, |i| i.encoder_input.as_slice(), seq_len, device);
        let decoder_input = ids_tensor(&items, |i| i.decoder_input.as_slice(), seq_len, device);
        let label         = ids_tensor(&items, |i| i.label.as_slice(), seq_len, device);

        let encoder_flat: Vec<bool> = items
            .iter()
            .flat_map(|item| item.encoder_mask.iter().copied())
            .collect();
        let encoder_mask = Tensor::from_data(
            TensorData::new(encoder_flat, [batch_size, 1, 1, seq_len]),
            device,
        );

        let decoder_flat: Vec<bool> = items
            .iter()
            .flat_map(|item| item.decoder_mask.iter().copied())
            .collect();
        let decoder_mask = Tensor::from_data(
            TensorData::new(decoder_flat, [batch_size, 1, seq_len, seq_len]),
            device,
        );

        let (source_texts, target_texts) = items
            .into_iter()
            .map(|item| (item.source_text, item.target_text))
            .unzip();

        TranslationBatch {
            encoder_input,
            decoder_input,
            label,
            encoder_mask,
            decoder_mask,
            source_texts,
            target_texts,
        }
    }
}
