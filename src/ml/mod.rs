// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The encoder-decoder Transformer and everything that runs it.
//
//   init.rs          — Xavier-uniform Linear / Embedding weights
//   embedding.rs     — Token embeddings (× √d_model) and the
//                      fixed sinusoidal positional encoding
//   attention.rs     — Multi-head scaled dot-product attention
//   norm.rs          — Layer normalisation (learned α and bias)
//   feed_forward.rs  — Position-wise Linear → ReLU → Linear
//   residual.rs      — Pre-norm residual wrapper around a sublayer
//   encoder.rs       — Encoder block (self-attn, FFN) × N + norm
//   decoder.rs       — Decoder block (masked self-attn, cross-attn,
//                      FFN) × N + norm
//   transformer.rs   — Config, assembly, encode / decode / project
//   trainer.rs       — Training loop, validation, checkpointing
//   inferencer.rs    — Greedy decoding and the Translator
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod init;
pub mod embedding;
pub mod attention;
pub mod norm;
pub mod feed_forward;
pub mod residual;
pub mod encoder;
pub mod decoder;

/// Full Transformer and its configuration
pub mod transformer;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Greedy decoding from a checkpoint
pub mod inferencer;
