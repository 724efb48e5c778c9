// Attention masks. `true` means "may attend".
//
//   causal_mask(4)      padding row [1 1 1 0]   decoder mask (AND)
//   1 0 0 0                                     1 0 0 0
//   1 1 0 0                                     1 1 0 0
//   1 1 1 0                                     1 1 1 0
//   1 1 1 1                                     1 1 1 0

use burn::{prelude::*, tensor::TensorData};

/// Lower-triangular (diagonal included) square mask: position `i` may
/// attend to `j` iff `j <= i`.
pub fn causal_mask(size: usize) -> Vec<Vec<bool>> {
    (0..size)
        .map(|i| (0..size).map(|j| j <= i).collect())
        .collect()
}

/// `causal_mask(size)` as a `[1, size, size]` Bool tensor.
pub fn causal_mask_tensor<B: Backend>(size: usize, device: &B::Device) -> Tensor<B, 3, Bool> {
    let flat: Vec<bool> = causal_mask(size).into_iter().flatten().collect();
    Tensor::from_data(TensorData::new(flat, [1, size, size]), device)
}

/// Row-major `[len, len]` mask combining the causal rule with a
/// per-key padding flag.
pub fn decoder_mask(nonpad: &[bool]) -> Vec<bool> {
    let causal = causal_mask(nonpad.len());
    causal
        .iter()
        .flat_map(|row| row.iter().zip(nonpad).map(|(&c, &p)| c && p))
        .collect()
}
