// ============================================================
// Typed errors for the model core and the dataset adapter
// ============================================================
// Every variant is a precondition violation surfaced straight
// to the caller. Nothing in the core retries or falls back.
//
// The application layer works in anyhow::Result and converts
// these with `?`.

/// Errors raised while building or running the Transformer.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A hyper-parameter combination the architecture cannot express,
    /// e.g. `d_model` not divisible by the head count.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// A sequence longer than the precomputed positional-encoding table.
    #[error("sequence length {len} exceeds the positional encoding table ({max} positions)")]
    SequenceTooLong { len: usize, max: usize },
}

/// Errors raised while turning a raw sentence pair into a training example.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// Source or target tokens plus their markers do not fit in `seq_len`.
    #[error(
        "sentence pair {index} is too long: {source_tokens} source / {target_tokens} target tokens for seq_len {seq_len}"
    )]
    SentenceTooLong {
        index:         usize,
        source_tokens: usize,
        target_tokens: usize,
        seq_len:       usize,
    },

    /// The tokenizer has no id for one of `[SOS]`, `[EOS]`, `[PAD]`.
    #[error("tokenizer has no id for special token '{0}'")]
    MissingSpecialToken(String),

    #[error("tokenisation failed: {0}")]
    Tokenize(String),

    #[error("index {index} out of range for dataset of {len} pairs")]
    IndexOutOfRange { index: usize, len: usize },
}
