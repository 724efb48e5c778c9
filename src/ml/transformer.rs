// ============================================================
// Layer 5 — Encoder-Decoder Transformer
// ============================================================
// Wires every building block into the full translation model:
//
//   src ids → InputEmbeddings → PositionalEncoding → Encoder ──┐
//                                                             │ encoder output
//   tgt ids → InputEmbeddings → PositionalEncoding → Decoder ◄┘
//                                                     │
//                                         ProjectionLayer → logits
//
// There is deliberately no single `forward`: encode, decode and
// project are separate entry points so greedy decoding can run
// the encoder once and reuse its output at every step.
//
// Source and target each get their own embedding table and
// positional encoding (vocabularies and maximum lengths may differ).
// Every block gets fresh attention / feed-forward sub-modules.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use burn::{nn::Linear, prelude::*};

use crate::error::ModelError;
use crate::ml::{
    attention::MultiHeadAttentionConfig,
    decoder::{Decoder, DecoderBlock},
    embedding::{InputEmbeddings, PositionalEncoding},
    encoder::{Encoder, EncoderBlock},
    feed_forward::FeedForwardBlock,
    init::xavier_linear,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TransformerConfig {
    pub src_vocab_size: usize,
    pub tgt_vocab_size: usize,
    /// Longest source sequence the positional table covers
    pub src_seq_len:    usize,
    /// Longest target sequence the positional table covers
    pub tgt_seq_len:    usize,
    #[config(default = 512)]
    pub d_model:        usize,
    /// N, the number of encoder blocks and of decoder blocks
    #[config(default = 6)]
    pub num_blocks:     usize,
    /// h, the number of attention heads
    #[config(default = 8)]
    pub num_heads:      usize,
    #[config(default = 0.1)]
    pub dropout:        f64,
    #[config(default = 2048)]
    pub d_ff:           usize,
}

impl TransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Transformer<B>, ModelError> {
        self.validate()?;

        let attention = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout);

        let encoder_blocks = (0..self.num_blocks)
            .map(|_| {
                Ok(EncoderBlock::new(
                    self.d_model,
                    attention.init(device)?,
                    FeedForwardBlock::new(self.d_model, self.d_ff, self.dropout, device),
                    self.dropout,
                    device,
                ))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let decoder_blocks = (0..self.num_blocks)
            .map(|_| {
                Ok(DecoderBlock::new(
                    self.d_model,
                    attention.init(device)?,
                    attention.init(device)?,
                    FeedForwardBlock::new(self.d_model, self.d_ff, self.dropout, device),
                    self.dropout,
                    device,
                ))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Transformer {
            encoder:    Encoder::new(self.d_model, encoder_blocks, device),
            decoder:    Decoder::new(self.d_model, decoder_blocks, device),
            src_embed:  InputEmbeddings::new(self.d_model, self.src_vocab_size, device),
            tgt_embed:  InputEmbeddings::new(self.d_model, self.tgt_vocab_size, device),
            src_pos:    PositionalEncoding::new(self.d_model, self.src_seq_len, self.dropout, device),
            tgt_pos:    PositionalEncoding::new(self.d_model, self.tgt_seq_len, self.dropout, device),
            projection: ProjectionLayer::new(self.d_model, self.tgt_vocab_size, device),
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        let sizes = [
            ("d_model", self.d_model),
            ("num_heads", self.num_heads),
            ("d_ff", self.d_ff),
            ("src_vocab_size", self.src_vocab_size),
            ("tgt_vocab_size", self.tgt_vocab_size),
            ("src_seq_len", self.src_seq_len),
            ("tgt_seq_len", self.tgt_seq_len),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(ModelError::InvalidConfig(format!("{name} must be greater than zero")));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ModelError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.d_model % self.num_heads != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "d_model ({}) is not divisible by the number of heads ({})",
                self.d_model, self.num_heads
            )));
        }
        Ok(())
    }
}

/// Builds a freshly initialised Transformer (Xavier-uniform weight matrices).
pub fn build_transformer<B: Backend>(
    config: &TransformerConfig,
    device: &B::Device,
) -> Result<Transformer<B>, ModelError> {
    config.init(device)
}

// ─── ProjectionLayer ──────────────────────────────────────────────────────────
/// d_model → target vocabulary logits. Softmax / cross-entropy are left to
/// the caller.
#[derive(Module, Debug)]
pub struct ProjectionLayer<B: Backend> {
    pub proj: Linear<B>,
}

impl<B: Backend> ProjectionLayer<B> {
    pub fn new(d_model: usize, vocab_size: usize, device: &B::Device) -> Self {
        Self { proj: xavier_linear(d_model, vocab_size, true, device) }
    }

    /// [batch, seq_len, d_model] → [batch, seq_len, vocab_size]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.proj.forward(x)
    }
}

// ─── Transformer ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    pub encoder:    Encoder<B>,
    pub decoder:    Decoder<B>,
    pub src_embed:  InputEmbeddings<B>,
    pub tgt_embed:  InputEmbeddings<B>,
    pub src_pos:    PositionalEncoding<B>,
    pub tgt_pos:    PositionalEncoding<B>,
    pub projection: ProjectionLayer<B>,
}

impl<B: Backend> Transformer<B> {
    /// src: [batch, src_len] ids, src_mask: [batch, 1, 1, src_len]
    /// → encoder output [batch, src_len, d_model]
    pub fn encode(
        &self,
        src:      Tensor<B, 2, Int>,
        src_mask: Tensor<B, 4, Bool>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let x = self.src_pos.forward(self.src_embed.forward(src))?;
        Ok(self.encoder.forward(x, Some(src_mask)))
    }

    /// tgt: [batch, tgt_len] ids, tgt_mask: [batch, 1, tgt_len, tgt_len]
    /// → decoder output [batch, tgt_len, d_model]
    pub fn decode(
        &self,
        encoder_output: Tensor<B, 3>,
        src_mask:       Tensor<B, 4, Bool>,
        tgt:            Tensor<B, 2, Int>,
        tgt_mask:       Tensor<B, 4, Bool>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let x = self.tgt_pos.forward(self.tgt_embed.forward(tgt))?;
        Ok(self.decoder.forward(x, encoder_output, Some(src_mask), Some(tgt_mask)))
    }

    /// [batch, tgt_len, d_model] → logits [batch, tgt_len, tgt_vocab_size]
    pub fn project(&self, decoder_output: Tensor<B, 3>) -> Tensor<B, 3> {
        self.projection.forward(decoder_output)
    }
}
