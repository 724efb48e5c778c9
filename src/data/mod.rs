// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw bilingual corpus
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   corpus.jsonl
//       │
//       ▼
//   JsonlCorpusLoader  → reads records, keeps the configured language pair
//       │
//       ▼
//   split_train_val    → seeded shuffle, 90% train / 10% validation
//       │
//       ▼
//   BilingualDataset   → tokenises, adds [SOS]/[EOS]/[PAD], builds masks
//       │
//       ▼
//   TranslationBatcher → stacks examples into tensor batches
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON-lines sentence pairs
pub mod loader;

/// Padding and causal attention masks
pub mod mask;

/// Implements Burn's Dataset trait for sentence pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
