// ============================================================
// Layer 5 — Pre-norm Residual Connection
// ============================================================
//   out = x + dropout(sublayer(norm(x)))
//
// The sublayer is anything implementing `Sublayer`: attention
// (self or cross, with its mask and memory captured) or the
// feed-forward block. The wrapper is generic over it, so the
// same residual code sits around every sublayer of both stacks.

use burn::{
    nn::{Dropout, DropoutConfig},
    prelude::*,
};

use crate::ml::attention::MultiHeadAttentionBlock;
use crate::ml::feed_forward::FeedForwardBlock;
use crate::ml::norm::LayerNormalization;

/// A transformation of the normalised residual stream.
pub trait Sublayer<B: Backend> {
    fn apply(&self, x: Tensor<B, 3>) -> Tensor<B, 3>;
}

/// Self-attention: query = key = value = x.
pub struct SelfAttention<'a, B: Backend> {
    pub block: &'a MultiHeadAttentionBlock<B>,
    pub mask:  Option<Tensor<B, 4, Bool>>,
}

impl<B: Backend> Sublayer<B> for SelfAttention<'_, B> {
    fn apply(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.block
            .forward(x.clone(), x.clone(), x, self.mask.clone())
            .context
    }
}

/// Cross-attention: queries from x, keys and values from `memory`.
pub struct CrossAttention<'a, B: Backend> {
    pub block:  &'a MultiHeadAttentionBlock<B>,
    pub memory: Tensor<B, 3>,
    pub mask:   Option<Tensor<B, 4, Bool>>,
}

impl<B: Backend> Sublayer<B> for CrossAttention<'_, B> {
    fn apply(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.block
            .forward(x, self.memory.clone(), self.memory.clone(), self.mask.clone())
            .context
    }
}

impl<B: Backend> Sublayer<B> for FeedForwardBlock<B> {
    fn apply(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct ResidualConnection<B: Backend> {
    norm:    LayerNormalization<B>,
    dropout: Dropout,
}

impl<B: Backend> ResidualConnection<B> {
    pub fn new(features: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            norm:    LayerNormalization::new(features, device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward<S: Sublayer<B>>(&self, x: Tensor<B, 3>, sublayer: &S) -> Tensor<B, 3> {
        let update = sublayer.apply(self.norm.forward(x.clone()));
        x + self.dropout.forward(update)
    }
}
