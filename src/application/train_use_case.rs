// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load sentence pairs          (Layer 4 - data)
//   Step 2: Build / load tokenizers      (Layer 6 - infra)
//   Step 3: Measure and filter lengths   (this file)
//   Step 4: Split train/validation       (Layer 4 - data)
//   Step 5: Build datasets               (Layer 4 - data)
//   Step 6: Save config                  (Layer 6 - infra)
//   Step 7: Run training loop            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::BilingualDataset,
    loader::JsonlCorpusLoader,
    splitter::split_train_val,
};
use crate::domain::traits::{PairSource, TextTokenizer};
use crate::domain::translation_pair::TranslationPair;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{trainer::run_training, transformer::TransformerConfig};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoints so translation can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path:    String,
    pub lang_src:       String,
    pub lang_tgt:       String,
    pub checkpoint_dir: String,
    /// `None`, `"latest"` or an epoch number to resume from
    pub preload:        Option<String>,
    pub seq_len:        usize,
    pub batch_size:     usize,
    pub num_epochs:     usize,
    pub lr:             f64,
    pub d_model:        usize,
    pub num_blocks:     usize,
    pub num_heads:      usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    pub min_frequency:  usize,
    pub train_fraction: f64,
    pub seed:           u64,
    pub num_workers:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:    "data/opus_books_en_it.jsonl".to_string(),
            lang_src:       "en".to_string(),
            lang_tgt:       "it".to_string(),
            checkpoint_dir: "opus_books_weights".to_string(),
            preload:        None,
            seq_len:        350,
            batch_size:     8,
            num_epochs:     40,
            lr:             1e-4,
            d_model:        512,
            num_blocks:     6,
            num_heads:      8,
            d_ff:           2048,
            dropout:        0.1,
            min_frequency:  2,
            train_fraction: 0.9,
            seed:           42,
            num_workers:    1,
        }
    }
}

impl TrainConfig {
    /// Model architecture for the given vocabulary sizes.
    /// Source and target share `seq_len`.
    pub fn model_config(&self, src_vocab_size: usize, tgt_vocab_size: usize) -> TransformerConfig {
        TransformerConfig::new(src_vocab_size, tgt_vocab_size, self.seq_len, self.seq_len)
            .with_d_model(self.d_model)
            .with_num_blocks(self.num_blocks)
            .with_num_heads(self.num_heads)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
    }
}

/// Longest tokenised sentences seen and how many pairs were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthReport {
    pub max_source_tokens: usize,
    pub max_target_tokens: usize,
    pub skipped:           usize,
}

/// Keep the pairs whose tokens plus markers fit in `seq_len`:
/// source + [SOS] + [EOS], target + one marker.
pub fn keep_fitting_pairs<S, T>(
    pairs:         Vec<TranslationPair>,
    tokenizer_src: &S,
    tokenizer_tgt: &T,
    seq_len:       usize,
) -> Result<(Vec<TranslationPair>, LengthReport)>
where
    S: TextTokenizer + ?Sized,
    T: TextTokenizer + ?Sized,
{
    let mut report = LengthReport::default();
    let mut kept   = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let src_len = tokenizer_src.encode_ids(&pair.source)?.len();
        let tgt_len = tokenizer_tgt.encode_ids(&pair.target)?.len();
        report.max_source_tokens = report.max_source_tokens.max(src_len);
        report.max_target_tokens = report.max_target_tokens.max(tgt_len);

        if src_len + 2 > seq_len || tgt_len + 1 > seq_len {
            report.skipped += 1;
            continue;
        }
        kept.push(pair);
    }

    Ok((kept, report))
}

/// Everything the training loop needs, built from the corpus.
pub struct PreparedData {
    pub train:     BilingualDataset<Tokenizer, Tokenizer>,
    pub valid:     BilingualDataset<Tokenizer, Tokenizer>,
    pub model_cfg: TransformerConfig,
    pub lengths:   LengthReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Steps 1–6: corpus → tokenizers → datasets, config saved.
    pub fn prepare(&self, ckpt_manager: &CheckpointManager) -> Result<PreparedData> {
        let cfg = &self.config;

        // ── Step 1: Load sentence pairs ───────────────────────────────────────
        let loader = JsonlCorpusLoader::new(&cfg.corpus_path, &cfg.lang_src, &cfg.lang_tgt);
        let pairs  = loader.load_pairs()?;
        if pairs.is_empty() {
            bail!(
                "No {}→{} pairs found in '{}'",
                cfg.lang_src, cfg.lang_tgt, cfg.corpus_path
            );
        }

        // ── Step 2: Build / load tokenizers ───────────────────────────────────
        // Built from the whole corpus, before the split
        let tok_store = TokenizerStore::new(ckpt_manager.dir(), cfg.min_frequency);
        let tokenizer_src = Arc::new(
            tok_store.load_or_build(&cfg.lang_src, pairs.iter().map(|p| p.source.as_str()))?,
        );
        let tokenizer_tgt = Arc::new(
            tok_store.load_or_build(&cfg.lang_tgt, pairs.iter().map(|p| p.target.as_str()))?,
        );

        // ── Step 3: Measure and filter lengths ────────────────────────────────
        let (pairs, lengths) =
            keep_fitting_pairs(pairs, tokenizer_src.as_ref(), tokenizer_tgt.as_ref(), cfg.seq_len)?;
        tracing::info!("Max length of source sentence: {}", lengths.max_source_tokens);
        tracing::info!("Max length of target sentence: {}", lengths.max_target_tokens);
        if lengths.skipped > 0 {
            tracing::warn!(
                "Skipped {} pairs longer than seq_len={}",
                lengths.skipped, cfg.seq_len
            );
        }

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_pairs, val_pairs) = split_train_val(pairs, cfg.train_fraction, cfg.seed);
        if train_pairs.is_empty() {
            bail!("No training pairs left after filtering and splitting");
        }
        if val_pairs.is_empty() {
            tracing::warn!("Validation set is empty; validation loss will be NaN");
        }
        tracing::info!(
            "Split: {} train, {} validation",
            train_pairs.len(),
            val_pairs.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train = BilingualDataset::new(
            train_pairs,
            Arc::clone(&tokenizer_src),
            Arc::clone(&tokenizer_tgt),
            cfg.seq_len,
        )?;
        let valid = BilingualDataset::new(
            val_pairs,
            Arc::clone(&tokenizer_src),
            Arc::clone(&tokenizer_tgt),
            cfg.seq_len,
        )?;
        let model_cfg = cfg.model_config(tokenizer_src.vocab_len(), tokenizer_tgt.vocab_len());

        // ── Step 6: Save config for translation ───────────────────────────────
        ckpt_manager.save_config(cfg)?;

        Ok(PreparedData { train, valid, model_cfg, lengths })
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let ckpt_manager = CheckpointManager::new(&self.config.checkpoint_dir)?;
        let prepared     = self.prepare(&ckpt_manager)?;

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        run_training(
            &self.config,
            &prepared.model_cfg,
            prepared.train,
            prepared.valid,
            &ckpt_manager,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WordTokenizer;
    use burn::data::dataset::Dataset;
    use std::io::Write;

    fn corpus_file(lines: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (en, it) in lines {
            let record = serde_json::json!({ "translation": { "en": en, "it": it } });
            writeln!(file, "{record}").unwrap();
        }
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.num_epochs, 40);
        assert_eq!(cfg.seq_len, 350);
        assert_eq!((cfg.lang_src.as_str(), cfg.lang_tgt.as_str()), ("en", "it"));
        assert_eq!(cfg.checkpoint_dir, "opus_books_weights");
        assert!(cfg.preload.is_none());
        assert!((cfg.lr - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_model_config_follows_train_config() {
        let cfg = TrainConfig { d_model: 64, num_heads: 4, seq_len: 20, ..TrainConfig::default() };
        let model_cfg = cfg.model_config(100, 200);
        assert_eq!(model_cfg.src_vocab_size, 100);
        assert_eq!(model_cfg.tgt_vocab_size, 200);
        assert_eq!(model_cfg.src_seq_len, 20);
        assert_eq!(model_cfg.tgt_seq_len, 20);
        assert_eq!(model_cfg.d_model, 64);
        assert_eq!(model_cfg.num_heads, 4);
        assert_eq!(model_cfg.num_blocks, 6);
    }

    #[test]
    fn test_keep_fitting_pairs() {
        let pairs = vec![
            TranslationPair::new("a b", "x y"),
            TranslationPair::new("a b c d", "x"),   // 4 + 2 > 5
            TranslationPair::new("a", "w x y z v"), // 5 + 1 > 5
            TranslationPair::new("a b c", "w x y z"),
        ];
        let tok = WordTokenizer::from_corpus(["a b c d w x y z v"]);

        let (kept, report) = keep_fitting_pairs(pairs, &tok, &tok, 5).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(
            report,
            LengthReport { max_source_tokens: 4, max_target_tokens: 5, skipped: 2 }
        );
    }

    #[test]
    fn test_prepare_builds_datasets_and_saves_config() {
        let corpus = corpus_file(&[
            ("the cat", "il gatto"),
            ("the dog", "il cane"),
            ("the cat and the dog", "il gatto e il cane"),
            ("the end", "la fine"),
            ("a very long sentence that will never fit", "una frase"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            corpus_path:    corpus.path().to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().to_string_lossy().into_owned(),
            seq_len:        8,
            train_fraction: 0.75,
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let prepared = TrainUseCase::new(cfg).prepare(&ckpt).unwrap();
        assert_eq!(prepared.lengths.skipped, 1);
        assert_eq!(prepared.train.len() + prepared.valid.len(), 4);
        assert_eq!(prepared.train.len(), 3);

        assert!(dir.path().join("tokenizer_en.json").exists());
        assert!(dir.path().join("tokenizer_it.json").exists());
        assert_eq!(ckpt.load_config().unwrap().seq_len, 8);

        // Vocab sizes come from the built tokenizers
        let it_vocab = prepared.valid.tokenizer_tgt().vocab_len();
        assert_eq!(prepared.model_cfg.tgt_vocab_size, it_vocab);
        assert!(prepared.train.get(0).is_some());
    }

    #[test]
    fn test_prepare_rejects_empty_corpus() {
        let corpus = corpus_file(&[]);
        let dir    = tempfile::tempdir().unwrap();
        let cfg    = TrainConfig {
            corpus_path: corpus.path().to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(TrainUseCase::new(cfg).prepare(&ckpt).is_err());
    }
}
