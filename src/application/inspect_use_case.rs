// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Loads a checkpoint on the CPU and summarises it: the run's
// configuration plus the parameter count of every component.
// Loading the weights also proves the checkpoint matches the
// saved architecture.

use std::fmt;

use anyhow::Result;
use burn::prelude::*;

use crate::application::{train_use_case::TrainConfig, translate_use_case::load_tokenizers};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::transformer::Transformer;

type InspectBackend = burn::backend::NdArray;

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub epoch:        usize,
    pub config:       TrainConfig,
    pub src_vocab:    usize,
    pub tgt_vocab:    usize,
    /// (component name, parameter count), in forward order
    pub components:   Vec<(String, usize)>,
    pub total_params: usize,
}

impl ModelReport {
    pub fn from_model<B: Backend>(
        model:     &Transformer<B>,
        epoch:     usize,
        config:    TrainConfig,
        src_vocab: usize,
        tgt_vocab: usize,
    ) -> Self {
        let mut components = vec![("src_embed".to_string(), model.src_embed.num_params())];
        for (i, block) in model.encoder.layers.iter().enumerate() {
            components.push((format!("encoder.layers.{i}"), block.num_params()));
        }
        components.push(("tgt_embed".to_string(), model.tgt_embed.num_params()));
        for (i, block) in model.decoder.layers.iter().enumerate() {
            components.push((format!("decoder.layers.{i}"), block.num_params()));
        }
        components.push(("projection".to_string(), model.projection.num_params()));

        Self {
            epoch,
            config,
            src_vocab,
            tgt_vocab,
            components,
            total_params: model.num_params(),
        }
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        writeln!(f, "Checkpoint epoch {}  ({} → {})", self.epoch, c.lang_src, c.lang_tgt)?;
        writeln!(
            f,
            "d_model={} N={} h={} d_ff={} seq_len={} vocab={}/{}",
            c.d_model, c.num_blocks, c.num_heads, c.d_ff, c.seq_len, self.src_vocab, self.tgt_vocab
        )?;
        for (name, params) in &self.components {
            writeln!(f, "  {name:<20} {params:>12}")?;
        }
        write!(f, "  {:<20} {:>12}", "total", self.total_params)
    }
}

pub struct InspectUseCase {
    ckpt_manager: CheckpointManager,
}

impl InspectUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        Ok(Self { ckpt_manager: CheckpointManager::new(checkpoint_dir)? })
    }

    /// `epoch` is `"latest"` or an epoch number.
    pub fn report(&self, epoch: &str) -> Result<ModelReport> {
        let cfg   = self.ckpt_manager.load_config()?;
        let epoch = self.ckpt_manager.resolve_preload(epoch)?;
        let (src, tgt) = load_tokenizers(&self.ckpt_manager, &cfg)?;

        let device = Default::default();
        let model: Transformer<InspectBackend> = cfg
            .model_config(src.vocab_len(), tgt.vocab_len())
            .init(&device)?;
        let model = self.ckpt_manager.load_model(model, epoch, &device)?;

        Ok(ModelReport::from_model(&model, epoch, cfg, src.vocab_len(), tgt.vocab_len()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;
    use crate::domain::traits::TextTokenizer;

    fn small_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            seq_len:        6,
            d_model:        4,
            num_blocks:     2,
            num_heads:      2,
            d_ff:           8,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_report_lists_every_block() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = small_config(dir.path());
        ckpt.save_config(&cfg).unwrap();

        let store = TokenizerStore::new(dir.path(), 1);
        let src = store.load_or_build("en", ["hello world"]).unwrap();
        let tgt = store.load_or_build("it", ["ciao"]).unwrap();

        let device = Default::default();
        let model: Transformer<InspectBackend> = cfg
            .model_config(src.vocab_len(), tgt.vocab_len())
            .init(&device)
            .unwrap();
        ckpt.save_model(&model, 3).unwrap();

        let report = InspectUseCase::new(&cfg.checkpoint_dir).unwrap().report("latest").unwrap();
        assert_eq!(report.epoch, 3);
        assert_eq!((report.src_vocab, report.tgt_vocab), (6, 5));

        let names: Vec<&str> = report.components.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "src_embed", "encoder.layers.0", "encoder.layers.1",
                "tgt_embed", "decoder.layers.0", "decoder.layers.1",
                "projection",
            ]
        );
        // Embeddings: vocab × d_model; projection: d_model × vocab + bias
        assert_eq!(report.components[0].1, 6 * 4);
        assert_eq!(report.components[6].1, 4 * 5 + 5);

        // Encoder/decoder final norms are the only parameters not listed
        let listed: usize = report.components.iter().map(|(_, p)| p).sum();
        assert_eq!(report.total_params, listed + 2 * (4 + 4));

        assert!(report.to_string().contains("total"));
    }

    #[test]
    fn test_report_without_checkpoint_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let inspect = InspectUseCase::new(&dir.path().to_string_lossy()).unwrap();
        assert!(inspect.report("latest").is_err());
    }
}
