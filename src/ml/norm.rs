// Per-token layer normalisation with learnable scale (alpha) and
// shift (bias). Batch norm is a poor fit for the small batches used
// in translation training, so every token is normalised on its own:
//
//   y = alpha * (x - mean) / (std + eps) + bias
//
// mean and std are taken over the last (feature) dimension; std is
// the unbiased estimate (n - 1 divisor).

use burn::{
    module::Param,
    prelude::*,
};

pub const LAYER_NORM_EPS: f64 = 1e-6;

#[derive(Module, Debug)]
pub struct LayerNormalization<B: Backend> {
    pub alpha: Param<Tensor<B, 1>>,
    pub bias:  Param<Tensor<B, 1>>,
    eps:       f64,
}

impl<B: Backend> LayerNormalization<B> {
    pub fn new(features: usize, device: &B::Device) -> Self {
        Self {
            alpha: Param::from_tensor(Tensor::ones([features], device)),
            bias:  Param::from_tensor(Tensor::zeros([features], device)),
            eps:   LAYER_NORM_EPS,
        }
    }

    /// x: [batch, seq_len, features] → same shape
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let mean = x.clone().mean_dim(2);        // [batch, seq_len, 1]
        let std  = x.clone().var(2).sqrt();      // [batch, seq_len, 1]
        let normalized = (x - mean).div(std.add_scalar(self.eps));

        normalized * self.alpha.val().unsqueeze::<3>() + self.bias.val().unsqueeze::<3>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_tokens_have_zero_mean_unit_std() {
        let device = Default::default();
        let norm   = LayerNormalization::<TestBackend>::new(4, &device);
        let x = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 2.0, 3.0, 4.0], [10.0, -10.0, 5.0, 0.0]]],
            &device,
        );

        let out = norm.forward(x).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        for token in out.chunks(4) {
            let mean: f32 = token.iter().sum::<f32>() / 4.0;
            let var: f32  = token.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 3.0;
            assert!(mean.abs() < 1e-5);
            assert!((var.sqrt() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_token_stays_finite() {
        let device = Default::default();
        let norm   = LayerNormalization::<TestBackend>::new(3, &device);
        let x      = Tensor::<TestBackend, 3>::ones([1, 2, 3], &device);

        let out = norm.forward(x).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!(out.iter().all(|v| v.is_finite() && v.abs() < 1e-6));
    }

    #[test]
    fn test_scale_and_shift_are_applied() {
        let device   = Default::default();
        let mut norm = LayerNormalization::<TestBackend>::new(2, &device);
        norm.alpha   = Param::from_tensor(Tensor::from_floats([2.0, 2.0], &device));
        norm.bias    = Param::from_tensor(Tensor::from_floats([1.0, -1.0], &device));

        // [0, 2]: mean 1, unbiased std sqrt(2)
        let x   = Tensor::<TestBackend, 3>::from_floats([[[0.0, 2.0]]], &device);
        let out = norm.forward(x).into_data().convert::<f32>().to_vec::<f32>().unwrap();

        let z = 1.0 / (2.0f32.sqrt() + 1e-6);
        assert!((out[0] - (-2.0 * z + 1.0)).abs() < 1e-5);
        assert!((out[1] - (2.0 * z - 1.0)).abs() < 1e-5);
    }
}
