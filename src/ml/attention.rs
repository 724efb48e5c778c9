// ============================================================
// Layer 5 — Multi-Head Attention
// ============================================================
// Scaled dot-product attention split across h heads:
//
//   Q, K, V  = x_q·W_q, x_k·W_k, x_v·W_v          (no bias)
//   head_i   = softmax(Q_i·K_iᵀ / √d_k + mask) · V_i
//   output   = concat(head_1..head_h) · W_o
//
// with d_k = d_model / h. Disallowed key positions are filled
// with -1e9 before the softmax so their weight comes out as 0.
// Dropout is applied to the attention weights, after softmax and
// before they are used to mix the values.
//
// Shapes through the block:
//   [batch, len, d_model] → [batch, len, h, d_k] → [batch, h, len, d_k]
//   scores / weights        [batch, h, q_len, k_len]
//   context                 [batch, h, q_len, d_k] → [batch, q_len, d_model]

use burn::{
    nn::{Dropout, DropoutConfig, Linear},
    prelude::*,
    tensor::activation::softmax,
};

use crate::error::ModelError;
use crate::ml::init::xavier_linear;

/// Score written into masked positions before softmax.
const MASKED_SCORE: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct MultiHeadAttentionConfig {
    pub d_model:   usize,
    pub num_heads: usize,
    #[config(default = 0.1)]
    pub dropout:   f64,
}

impl MultiHeadAttentionConfig {
    /// Fails unless `d_model` splits evenly into `num_heads` heads.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MultiHeadAttentionBlock<B>, ModelError> {
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(ModelError::InvalidConfig(format!(
                "d_model ({}) is not divisible by the number of heads ({})",
                self.d_model, self.num_heads
            )));
        }

        Ok(MultiHeadAttentionBlock {
            w_q:       xavier_linear(self.d_model, self.d_model, false, device),
            w_k:       xavier_linear(self.d_model, self.d_model, false, device),
            w_v:       xavier_linear(self.d_model, self.d_model, false, device),
            w_o:       xavier_linear(self.d_model, self.d_model, false, device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            d_model:   self.d_model,
            num_heads: self.num_heads,
            d_k:       self.d_model / self.num_heads,
        })
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttentionBlock<B: Backend> {
    pub w_q:   Linear<B>,
    pub w_k:   Linear<B>,
    pub w_v:   Linear<B>,
    pub w_o:   Linear<B>,
    dropout:   Dropout,
    d_model:   usize,
    num_heads: usize,
    d_k:       usize,
}

/// Result of one attention pass.
pub struct AttentionOutput<B: Backend> {
    /// [batch, q_len, d_model]
    pub context: Tensor<B, 3>,
    /// Post-softmax weights per head, [batch, h, q_len, k_len]
    pub weights: Tensor<B, 4>,
}

impl<B: Backend> MultiHeadAttentionBlock<B> {
    /// `mask` is `true` where a query may attend to a key. Its shape must
    /// broadcast to `[batch, h, q_len, k_len]`, e.g. `[batch, 1, 1, k_len]`
    /// for padding or `[batch, 1, q_len, k_len]` for causal+padding.
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key:   Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask:  Option<Tensor<B, 4, Bool>>,
    ) -> AttentionOutput<B> {
        let [batch, q_len, _] = query.dims();
        let [_, k_len, _]     = key.dims();

        let query = self.split_heads(self.w_q.forward(query), batch, q_len);
        let key   = self.split_heads(self.w_k.forward(key), batch, k_len);
        let value = self.split_heads(self.w_v.forward(value), batch, k_len);

        let scores = query
            .matmul(key.swap_dims(2, 3))
            .div_scalar((self.d_k as f64).sqrt());

        let scores = match mask {
            Some(mask) => {
                let blocked = mask.bool_not().expand([batch, self.num_heads, q_len, k_len]);
                scores.mask_fill(blocked, MASKED_SCORE)
            }
            None => scores,
        };

        let weights = softmax(scores, 3);
        let context = self
            .dropout
            .forward(weights.clone())
            .matmul(value)
            .swap_dims(1, 2)
            .reshape([batch, q_len, self.d_model]);

        AttentionOutput {
            context: self.w_o.forward(context),
            weights,
        }
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.d_k
    }

    // [batch, len, d_model] → [batch, h, len, d_k]
    fn split_heads(&self, x: Tensor<B, 3>, batch: usize, len: usize) -> Tensor<B, 4> {
        x.reshape([batch, len, self.num_heads, self.d_k]).swap_dims(1, 2)
    }
}
