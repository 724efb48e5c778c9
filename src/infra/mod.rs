// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory:
//
//   checkpoint.rs      — Transformer weights per epoch through
//                        Burn's full-precision recorder, the latest
//                        epoch pointer and the run's TrainConfig.
//
//   tokenizer_store.rs — One word-level tokenizer per language,
//                        built from the corpus on first use and
//                        reloaded afterwards so training and
//                        translation share a vocabulary.
//
//   metrics.rs         — Epoch-level train/validation loss
//                        appended to a CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
