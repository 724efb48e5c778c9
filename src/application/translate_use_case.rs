// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Loads everything a finished training run left behind:
//   1. train_config.json      → architecture and seq_len
//   2. tokenizer_{lang}.json  → both vocabularies
//   3. tmodel_NN weights      → latest, or a chosen epoch
// and greedy-decodes sentences with it.

use std::sync::Arc;

use anyhow::Result;

use crate::application::train_use_case::TrainConfig;
use crate::domain::traits::{TextTokenizer, Translator};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

/// Tokenizers saved by a training run, `(source, target)`.
pub fn load_tokenizers(
    ckpt_manager: &CheckpointManager,
    cfg:          &TrainConfig,
) -> Result<(Arc<dyn TextTokenizer>, Arc<dyn TextTokenizer>)> {
    let store = TokenizerStore::new(ckpt_manager.dir(), cfg.min_frequency);
    let src   = store.load(&cfg.lang_src)?;
    let tgt   = store.load(&cfg.lang_tgt)?;
    Ok((Arc::new(src), Arc::new(tgt)))
}

pub struct TranslateUseCase {
    inferencer: Inferencer<InferBackend>,
}

impl TranslateUseCase {
    /// `epoch` is a preload setting: `"latest"` or an epoch number.
    pub fn new(checkpoint_dir: &str, epoch: &str) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(checkpoint_dir)?;
        let cfg          = ckpt_manager.load_config()?;
        let epoch        = ckpt_manager.resolve_preload(epoch)?;

        let (tokenizer_src, tokenizer_tgt) = load_tokenizers(&ckpt_manager, &cfg)?;
        let inferencer = Inferencer::from_checkpoint(
            &ckpt_manager,
            epoch,
            tokenizer_src,
            tokenizer_tgt,
            Default::default(),
        )?;

        tracing::info!("Translating {} → {} with epoch {}", cfg.lang_src, cfg.lang_tgt, epoch);
        Ok(Self { inferencer })
    }
}

impl Translator for TranslateUseCase {
    fn translate(&self, text: &str) -> Result<String> {
        self.inferencer.translate(text)
    }
}
