// Decoder block and stack.
//
// Block:  x → residual(self-attention under causal+target padding mask)
//           → residual(cross-attention over the encoder output,
//                      under the source padding mask)
//           → residual(feed-forward)
// Stack:  N blocks sharing the same encoder output, one final norm.

use burn::prelude::*;

use crate::ml::attention::MultiHeadAttentionBlock;
use crate::ml::feed_forward::FeedForwardBlock;
use crate::ml::norm::LayerNormalization;
use crate::ml::residual::{CrossAttention, ResidualConnection, SelfAttention};

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attention:    MultiHeadAttentionBlock<B>,
    pub cross_attention:   MultiHeadAttentionBlock<B>,
    pub feed_forward:      FeedForwardBlock<B>,
    self_residual:         ResidualConnection<B>,
    cross_residual:        ResidualConnection<B>,
    feed_forward_residual: ResidualConnection<B>,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn new(
        features:        usize,
        self_attention:  MultiHeadAttentionBlock<B>,
        cross_attention: MultiHeadAttentionBlock<B>,
        feed_forward:    FeedForwardBlock<B>,
        dropout:         f64,
        device:          &B::Device,
    ) -> Self {
        Self {
            self_attention,
            cross_attention,
            feed_forward,
            self_residual:         ResidualConnection::new(features, dropout, device),
            cross_residual:        ResidualConnection::new(features, dropout, device),
            feed_forward_residual: ResidualConnection::new(features, dropout, device),
        }
    }

    /// x:              [batch, tgt_len, d_model]
    /// encoder_output: [batch, src_len, d_model]
    /// src_mask:       [batch, 1, 1, src_len]
    /// tgt_mask:       [batch, 1, tgt_len, tgt_len]
    pub fn forward(
        &self,
        x:              Tensor<B, 3>,
        encoder_output: Tensor<B, 3>,
        src_mask:       Option<Tensor<B, 4, Bool>>,
        tgt_mask:       Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        let self_attention = SelfAttention { block: &self.self_attention, mask: tgt_mask };
        let x = self.self_residual.forward(x, &self_attention);

        let cross_attention = CrossAttention {
            block:  &self.cross_attention,
            memory: encoder_output,
            mask:   src_mask,
        };
        let x = self.cross_residual.forward(x, &cross_attention);

        self.feed_forward_residual.forward(x, &self.feed_forward)
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub layers: Vec<DecoderBlock<B>>,
    norm:       LayerNormalization<B>,
}

impl<B: Backend> Decoder<B> {
    pub fn new(features: usize, layers: Vec<DecoderBlock<B>>, device: &B::Device) -> Self {
        Self {
            layers,
            norm: LayerNormalization::new(features, device),
        }
    }

    pub fn forward(
        &self,
        mut x:          Tensor<B, 3>,
        encoder_output: Tensor<B, 3>,
        src_mask:       Option<Tensor<B, 4, Bool>>,
        tgt_mask:       Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        for layer in &self.layers {
            x = layer.forward(x, encoder_output.clone(), src_mask.clone(), tgt_mask.clone());
        }
        self.norm.forward(x)
    }
}
