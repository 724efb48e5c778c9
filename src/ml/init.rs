// Xavier/Glorot uniform initialisation for weight matrices.
//
// Only the 2-D weights are re-initialised; bias vectors keep Burn's
// default fan-in uniform init, and norm scale/shift stay at ones/zeros.

use burn::{
    nn::{Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};

fn xavier_uniform() -> Initializer {
    Initializer::XavierUniform { gain: 1.0 }
}

/// A `d_input → d_output` linear layer with a Xavier-uniform weight.
pub fn xavier_linear<B: Backend>(
    d_input:  usize,
    d_output: usize,
    bias:     bool,
    device:   &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output)
        .with_bias(bias)
        .init(device);
    // Burn stores the weight as [d_input, d_output]
    linear.weight = xavier_uniform().init_with(
        [d_input, d_output],
        Some(d_input),
        Some(d_output),
        device,
    );
    linear
}

/// A `vocab_size × d_model` lookup table with a Xavier-uniform weight.
pub fn xavier_embedding<B: Backend>(
    vocab_size: usize,
    d_model:    usize,
    device:     &B::Device,
) -> Embedding<B> {
    let mut embedding = EmbeddingConfig::new(vocab_size, d_model).init(device);
    embedding.weight = xavier_uniform().init_with(
        [vocab_size, d_model],
        Some(d_model),
        Some(vocab_size),
        device,
    );
    embedding
}
