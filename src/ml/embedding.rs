// ============================================================
// Layer 5 — Token Embeddings and Positional Encoding
// ============================================================
// Self-attention is permutation-invariant, so position has to
// be injected explicitly. Here that is the fixed sinusoidal
// signal of Vaswani et al. (2017):
//
//   PE[pos, 2i]   = sin(pos / 10000^(2i/d_model))
//   PE[pos, 2i+1] = cos(pos / 10000^(2i/d_model))
//
// The table is computed once at construction and stored as a
// plain tensor field: it is saved with the model record but is
// not a Param, so the optimiser never updates it.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding},
    prelude::*,
};

use crate::error::ModelError;
use crate::ml::init::xavier_embedding;

// ─── InputEmbeddings ──────────────────────────────────────────────────────────
/// Token id → `d_model` vector lookup, scaled by `sqrt(d_model)` so the
/// embeddings are not drowned out by the positional signal.
#[derive(Module, Debug)]
pub struct InputEmbeddings<B: Backend> {
    embedding: Embedding<B>,
    d_model:   usize,
}

impl<B: Backend> InputEmbeddings<B> {
    pub fn new(d_model: usize, vocab_size: usize, device: &B::Device) -> Self {
        Self {
            embedding: xavier_embedding(vocab_size, d_model, device),
            d_model,
        }
    }

    /// ids: [batch, seq_len] → [batch, seq_len, d_model]
    ///
    /// Ids must lie in `[0, vocab_size)`.
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding
            .forward(ids)
            .mul_scalar((self.d_model as f64).sqrt())
    }
}

// ─── PositionalEncoding ───────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// [max_len, d_model], never trained
    table:   Tensor<B, 2>,
    dropout: Dropout,
    max_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    pub fn new(d_model: usize, max_len: usize, dropout: f64, device: &B::Device) -> Self {
        let values = sinusoid_table(max_len, d_model);
        let table  = Tensor::<B, 1>::from_floats(values.as_slice(), device)
            .reshape([max_len, d_model]);

        Self {
            table,
            dropout: DropoutConfig::new(dropout).init(),
            max_len,
        }
    }

    /// x: [batch, seq_len, d_model] → x + PE[:seq_len], then dropout.
    ///
    /// Fails when `seq_len` is longer than the precomputed table.
    pub fn forward(&self, x: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let [_, seq_len, d_model] = x.dims();
        if seq_len > self.max_len {
            return Err(ModelError::SequenceTooLong { len: seq_len, max: self.max_len });
        }

        let positions = self
            .table
            .clone()
            .slice([0..seq_len, 0..d_model])
            .unsqueeze::<3>(); // [1, seq_len, d_model], broadcast over batch

        Ok(self.dropout.forward(x + positions))
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Row-major `[max_len, d_model]` sinusoid values.
pub fn sinusoid_table(max_len: usize, d_model: usize) -> Vec<f32> {
    let mut table = vec![0.0f32; max_len * d_model];
    let log_base  = -(10_000f64.ln()) / d_model as f64;

    for pos in 0..max_len {
        let row = &mut table[pos * d_model..(pos + 1) * d_model];
        for i in (0..d_model).step_by(2) {
            let angle = pos as f64 * (i as f64 * log_base).exp();
            row[i] = angle.sin() as f32;
            if i + 1 < d_model {
                row[i + 1] = angle.cos() as f32;
            }
        }
    }
    table
}
