// Position-wise feed-forward block:
//   [.., d_model] → Linear → ReLU → Dropout → Linear → [.., d_model]
// Each position is transformed independently.

use burn::{
    nn::{Dropout, DropoutConfig, Linear},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::init::xavier_linear;

#[derive(Module, Debug)]
pub struct FeedForwardBlock<B: Backend> {
    pub linear_1: Linear<B>,
    pub linear_2: Linear<B>,
    dropout:      Dropout,
}

impl<B: Backend> FeedForwardBlock<B> {
    pub fn new(d_model: usize, d_ff: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            linear_1: xavier_linear(d_model, d_ff, true, device),
            linear_2: xavier_linear(d_ff, d_model, true, device),
            dropout:  DropoutConfig::new(dropout).init(),
        }
    }

    /// [batch, seq_len, d_model] → [batch, seq_len, d_ff] → [batch, seq_len, d_model]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.dropout.forward(relu(self.linear_1.forward(x)));
        self.linear_2.forward(hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_shape_is_preserved() {
        let device = Default::default();
        let ffn    = FeedForwardBlock::<TestBackend>::new(8, 32, 0.0, &device);
        let x = Tensor::<TestBackend, 3>::random([2, 6, 8], Distribution::Default, &device);
        assert_eq!(ffn.forward(x).dims(), [2, 6, 8]);
    }

    #[test]
    fn test_positions_do_not_mix() {
        let device = Default::default();
        let ffn    = FeedForwardBlock::<TestBackend>::new(4, 8, 0.0, &device);
        let x = Tensor::<TestBackend, 3>::random([1, 3, 4], Distribution::Default, &device);

        let full = ffn.forward(x.clone()).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        // Running position 1 alone gives the same vector
        let alone = ffn
            .forward(x.slice([0..1, 1..2, 0..4]))
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap();
        for (a, b) in full[4..8].iter().zip(&alone) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
