// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores Transformer weights using Burn's
// gzipped named-msgpack recorder at full (f32) precision.
//
// What gets saved:
//   1. Model weights (tmodel_NN.mpk.gz)     — one file per epoch
//   2. Adam state (tmodel_NN_optim.mpk.gz)  — moments, for resuming
//   3. latest_epoch.json                    — which epoch was last saved
//   4. train_config.json                    — the run's TrainConfig
//
// The config is needed to rebuild the exact architecture
// (vocab sizes, d_model, N, h, ...) before the weights can be
// loaded back into it.
//
// File layout:
//   opus_books_weights/
//     tmodel_01.mpk.gz        ← weights after epoch 1
//     tmodel_01_optim.mpk.gz
//     tmodel_02.mpk.gz
//     ...
//     latest_epoch.json
//     train_config.json
//     tokenizer_en.json
//     tokenizer_it.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::transformer::Transformer;

/// Full f32 precision: weights reload bit for bit.
type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/tmodel_{epoch:02}`, without extension (the recorder adds it)
    pub fn weights_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("tmodel_{epoch:02}"))
    }

    pub fn optimizer_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("tmodel_{epoch:02}_optim"))
    }

    /// Save model weights for `epoch` and move the latest pointer to it.
    pub fn save_model<B: Backend>(&self, model: &Transformer<B>, epoch: usize) -> Result<()> {
        let path = self.weights_path(epoch);

        CheckpointRecorder::default()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the weights saved for `epoch` into `model`.
    ///
    /// `model` must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  Transformer<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<Transformer<B>> {
        let path = self.weights_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CheckpointRecorder::default()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the optimizer state next to the weights of `epoch`.
    pub fn save_optimizer<B, O>(&self, optim: &O, epoch: usize) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<Transformer<B>, B>,
    {
        let path = self.optimizer_path(epoch);
        Recorder::<B>::record(&CheckpointRecorder::default(), optim.to_record(), path.clone())
            .with_context(|| {
                format!("Failed to save optimizer state to '{}'", path.display())
            })?;
        Ok(())
    }

    /// Read the optimizer state saved with `epoch`.
    pub fn load_optimizer_record<B, O>(&self, epoch: usize, device: &B::Device) -> Result<O::Record>
    where
        B: AutodiffBackend,
        O: Optimizer<Transformer<B>, B>,
    {
        let path = self.optimizer_path(epoch);
        Recorder::<B>::load(&CheckpointRecorder::default(), path.clone(), device)
            .with_context(|| {
                format!("Cannot load optimizer state '{}'", path.display())
            })
    }

    /// Epoch of the most recent checkpoint, `None` before the first save.
    pub fn latest_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join("latest_epoch.json");
        if !path.exists() {
            return Ok(None);
        }

        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str::<usize>(s.trim())?))
    }

    /// Turn a preload setting into an epoch number:
    /// `"latest"` → the latest checkpoint, `"<n>"` → epoch n.
    pub fn resolve_preload(&self, preload: &str) -> Result<usize> {
        if preload == "latest" {
            return match self.latest_epoch()? {
                Some(epoch) => Ok(epoch),
                None => bail!(
                    "No checkpoint found in '{}'. Have you run 'train' first?",
                    self.dir.display()
                ),
            };
        }

        preload
            .parse::<usize>()
            .with_context(|| format!("Invalid preload '{preload}': expected 'latest' or an epoch number"))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'translate'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }
}
