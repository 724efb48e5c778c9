// Encoder block and stack.
//
// Block:  x → residual(self-attention under the source padding mask)
//           → residual(feed-forward)
// Stack:  N blocks in sequence, one final layer norm.
// No causal masking here: every source position may attend to every
// non-pad source position.

use burn::prelude::*;

use crate::ml::attention::MultiHeadAttentionBlock;
use crate::ml::feed_forward::FeedForwardBlock;
use crate::ml::norm::LayerNormalization;
use crate::ml::residual::{ResidualConnection, SelfAttention};

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attention:    MultiHeadAttentionBlock<B>,
    pub feed_forward:      FeedForwardBlock<B>,
    attention_residual:    ResidualConnection<B>,
    feed_forward_residual: ResidualConnection<B>,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn new(
        features:       usize,
        self_attention: MultiHeadAttentionBlock<B>,
        feed_forward:   FeedForwardBlock<B>,
        dropout:        f64,
        device:         &B::Device,
    ) -> Self {
        Self {
            self_attention,
            feed_forward,
            attention_residual:    ResidualConnection::new(features, dropout, device),
            feed_forward_residual: ResidualConnection::new(features, dropout, device),
        }
    }

    /// x: [batch, src_len, d_model], src_mask: [batch, 1, 1, src_len]
    pub fn forward(&self, x: Tensor<B, 3>, src_mask: Option<Tensor<B, 4, Bool>>) -> Tensor<B, 3> {
        let attention = SelfAttention { block: &self.self_attention, mask: src_mask };
        let x = self.attention_residual.forward(x, &attention);
        self.feed_forward_residual.forward(x, &self.feed_forward)
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub layers: Vec<EncoderBlock<B>>,
    norm:       LayerNormalization<B>,
}

impl<B: Backend> Encoder<B> {
    pub fn new(features: usize, layers: Vec<EncoderBlock<B>>, device: &B::Device) -> Self {
        Self {
            layers,
            norm: LayerNormalization::new(features, device),
        }
    }

    pub fn forward(&self, mut x: Tensor<B, 3>, mask: Option<Tensor<B, 4, Bool>>) -> Tensor<B, 3> {
        for layer in &self.layers {
            x = layer.forward(x, mask.clone());
        }
        self.norm.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::attention::MultiHeadAttentionConfig;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray;

    fn encoder(d_model: usize, heads: usize, blocks: usize) -> Encoder<TestBackend> {
        let device = Default::default();
        let layers = (0..blocks)
            .map(|_| {
                let attention = MultiHeadAttentionConfig::new(d_model, heads)
                    .with_dropout(0.0)
                    .init(&device)
                    .unwrap();
                let ffn = FeedForwardBlock::new(d_model, d_model * 4, 0.0, &device);
                EncoderBlock::new(d_model, attention, ffn, 0.0, &device)
            })
            .collect();
        Encoder::new(d_model, layers, &device)
    }

    #[test]
    fn test_stack_preserves_shape() {
        let device  = Default::default();
        let encoder = encoder(8, 2, 3);
        let x = Tensor::<TestBackend, 3>::random([2, 6, 8], Distribution::Default, &device);
        assert_eq!(encoder.forward(x, None).dims(), [2, 6, 8]);
        assert_eq!(encoder.layers.len(), 3);
    }

    #[test]
    fn test_padding_keys_do_not_affect_real_positions() {
        let device  = Default::default();
        let encoder = encoder(8, 2, 2);
        let mask = Tensor::<TestBackend, 4, Bool>::from_data(
            TensorData::new(vec![true, true, true, false], [1, 1, 1, 4]),
            &device,
        );

        let x = Tensor::<TestBackend, 3>::random([1, 4, 8], Distribution::Default, &device);
        // Same real tokens, different garbage in the padded slot
        let noise = Tensor::<TestBackend, 3>::random([1, 1, 8], Distribution::Default, &device);
        let y = Tensor::cat(vec![x.clone().slice([0..1, 0..3, 0..8]), noise], 1);

        let a = encoder.forward(x, Some(mask.clone())).slice([0..1, 0..3, 0..8]);
        let b = encoder.forward(y, Some(mask)).slice([0..1, 0..3, 0..8]);
        let a = a.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        let b = b.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        for (u, v) in a.iter().zip(&b) {
            assert!((u - v).abs() < 1e-4);
        }
    }
}
