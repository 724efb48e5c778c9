// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend, with
//     dropout disabled, for validation and sample translations
//   - Logits [batch, seq_len, vocab] are flattened to
//     [batch*seq_len, vocab] against labels [batch*seq_len];
//     [PAD] positions are ignored and labels smoothed by 0.1.
//     The reported loss is the mean over real (non-pad) tokens.
//
// After every epoch: weights + optimizer state are checkpointed
// and the epoch's losses appended to metrics.csv.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::{BilingualDataset, SpecialTokens},
};
use crate::domain::traits::TextTokenizer;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    inferencer::greedy_decode,
    transformer::{Transformer, TransformerConfig},
};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// The optimizer `AdamConfig::init` builds for a Transformer.
pub type AdamOptimizer<B> = OptimizerAdaptor<Adam, Transformer<B>, B>;

/// Validation sentences greedy-decoded and logged after each epoch
const NUM_SAMPLE_TRANSLATIONS: usize = 2;
const LABEL_SMOOTHING: f32 = 0.1;

pub fn run_training<S, T>(
    cfg:           &TrainConfig,
    model_cfg:     &TransformerConfig,
    train_dataset: BilingualDataset<S, T>,
    val_dataset:   BilingualDataset<S, T>,
    ckpt_manager:  &CheckpointManager,
) -> Result<()>
where
    S: TextTokenizer + 'static,
    T: TextTokenizer + 'static,
{
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend, S, T>(cfg, model_cfg, train_dataset, val_dataset, ckpt_manager, device)?;
    Ok(())
}

fn loss_fn<B: Backend>(pad: u32, device: &B::Device) -> CrossEntropyLoss<B> {
    CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![pad as usize]))
        .with_smoothing(Some(LABEL_SMOOTHING))
        .init(device)
}

/// Cross-entropy averaged over the non-pad rows of `labels`.
///
/// Burn zeroes pad rows but still divides by every row, so its value is
/// scaled back up by `rows / real_rows`.
fn token_mean_loss<B: Backend>(
    loss:   &CrossEntropyLoss<B>,
    logits: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
    pad:    u32,
) -> Tensor<B, 1> {
    let [rows] = labels.dims();
    let real_rows = labels
        .clone()
        .not_equal_elem(pad as i64)
        .float()
        .sum()
        .clamp_min(1.0);

    loss.forward(logits, labels).mul_scalar(rows as f32).div(real_rows)
}

/// Forward one batch and return the mean loss over non-pad positions.
fn batch_loss<B: Backend>(
    model: &Transformer<B>,
    batch: TranslationBatch<B>,
    loss:  &CrossEntropyLoss<B>,
    pad:   u32,
) -> Result<Tensor<B, 1>> {
    let encoder_output = model.encode(batch.encoder_input, batch.encoder_mask.clone())?;
    let decoder_output = model.decode(
        encoder_output,
        batch.encoder_mask,
        batch.decoder_input,
        batch.decoder_mask,
    )?;
    let logits = model.project(decoder_output);

    let [batch_size, seq_len, vocab] = logits.dims();
    Ok(token_mean_loss(
        loss,
        logits.reshape([batch_size * seq_len, vocab]),
        batch.label.reshape([batch_size * seq_len]),
        pad,
    ))
}

/// Train from scratch, or resume when `cfg.preload` is set.
/// Returns the metrics of every epoch run.
pub fn train_loop<B, S, T>(
    cfg:           &TrainConfig,
    model_cfg:     &TransformerConfig,
    train_dataset: BilingualDataset<S, T>,
    val_dataset:   BilingualDataset<S, T>,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<Vec<EpochMetrics>>
where
    B: AutodiffBackend,
    S: TextTokenizer + 'static,
    T: TextTokenizer + 'static,
{
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Transformer<B> = model_cfg.init(&device)?;
    tracing::info!(
        "Model ready: {} blocks, d_model={}, {} parameters",
        model_cfg.num_blocks,
        model_cfg.d_model,
        model.num_params()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim: AdamOptimizer<B> = AdamConfig::new()
        .with_epsilon(1e-9)
        .init::<B, Transformer<B>>();

    // ── Resume ────────────────────────────────────────────────────────────────
    let mut first_epoch = 1;
    if let Some(preload) = &cfg.preload {
        let epoch = ckpt_manager.resolve_preload(preload)?;
        model = ckpt_manager.load_model(model, epoch, &device)?;
        match ckpt_manager.load_optimizer_record::<B, AdamOptimizer<B>>(epoch, &device) {
            Ok(record) => optim = optim.load_record(record),
            Err(e) => tracing::warn!("Optimizer state not restored, starting fresh: {:#}", e),
        }
        first_epoch = epoch + 1;
        tracing::info!("Resuming training at epoch {}", first_epoch);
    }

    let special       = train_dataset.special_tokens();
    let tokenizer_tgt = Arc::clone(val_dataset.tokenizer_tgt());
    let max_len       = val_dataset.seq_len();
    let train_loss_fn = loss_fn::<B>(special.pad, &device);
    let val_loss_fn   = loss_fn::<B::InnerBackend>(special.pad, &device);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::<B, _, _>::new(TranslationBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::<B::InnerBackend, _, _>::new(TranslationBatcher::new())
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(val_dataset);

    let metrics_logger = MetricsLogger::new(ckpt_manager.dir())?;
    let mut history    = Vec::new();
    // A resumed run only beats the epochs it continues from
    let mut best_val   = metrics_logger
        .best_val_loss_before(first_epoch)?
        .unwrap_or(f64::INFINITY);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in first_epoch..=cfg.num_epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = batch_loss(&model, batch, &train_loss_fn, special.pad)?;

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;
            tracing::debug!("epoch {} batch {}: loss={:.4}", epoch, train_batches, loss_val);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut samples_left = NUM_SAMPLE_TRANSLATIONS;

        for batch in val_loader.iter() {
            if samples_left > 0 {
                samples_left -= log_sample_translations(
                    &model_valid,
                    &batch,
                    special,
                    tokenizer_tgt.as_ref(),
                    max_len,
                    samples_left,
                    &device,
                )?;
            }

            let loss = batch_loss(&model_valid, batch, &val_loss_fn, special.pad)?;
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, cfg.num_epochs, avg_train_loss, avg_val_loss,
        );

        let metrics = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss);
        if metrics.is_improvement(best_val) {
            best_val = metrics.val_loss;
            tracing::info!("New best validation loss {:.4}", best_val);
        }
        metrics_logger.log(&metrics)?;

        ckpt_manager.save_model(&model, epoch)?;
        ckpt_manager.save_optimizer(&optim, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        history.push(metrics);
    }

    tracing::info!("Training complete!");
    Ok(history)
}

/// Greedy-decode up to `limit` rows of a validation batch and log them.
/// Returns how many were logged.
fn log_sample_translations<B: Backend, T: TextTokenizer + ?Sized>(
    model:     &Transformer<B>,
    batch:     &TranslationBatch<B>,
    special:   SpecialTokens,
    tokenizer: &T,
    max_len:   usize,
    limit:     usize,
    device:    &B::Device,
) -> Result<usize> {
    let [rows, seq_len] = batch.encoder_input.dims();
    let count = rows.min(limit);

    for row in 0..count {
        let source = batch.encoder_input.clone().slice([row..row + 1, 0..seq_len]);
        let mask   = batch.encoder_mask.clone().slice([row..row + 1, 0..1, 0..1, 0..seq_len]);

        let ids       = greedy_decode(model, source, mask, special, max_len, device)?;
        let predicted = tokenizer.decode_ids(&ids)?;

        tracing::info!("SOURCE:    {}", batch.source_texts[row]);
        tracing::info!("TARGET:    {}", batch.target_texts[row]);
        tracing::info!("PREDICTED: {}", predicted);
    }

    Ok(count)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::translation_pair::TranslationPair;
    use crate::testing::WordTokenizer;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn pairs() -> Vec<TranslationPair> {
        vec![
            TranslationPair::new("the cat", "il gatto"),
            TranslationPair::new("the dog", "il cane"),
            TranslationPair::new("a cat", "un gatto"),
            TranslationPair::new("a dog", "un cane"),
            TranslationPair::new("the cat sleeps", "il gatto dorme"),
            TranslationPair::new("the dog sleeps", "il cane dorme"),
        ]
    }

    fn setup(epochs: usize, preload: Option<&str>, dir: &std::path::Path) -> (
        TrainConfig,
        TransformerConfig,
        BilingualDataset<WordTokenizer, WordTokenizer>,
        BilingualDataset<WordTokenizer, WordTokenizer>,
    ) {
        let all = pairs();
        let src = Arc::new(WordTokenizer::from_corpus(all.iter().map(|p| p.source.as_str())));
        let tgt = Arc::new(WordTokenizer::from_corpus(all.iter().map(|p| p.target.as_str())));

        let cfg = TrainConfig {
            num_epochs:     epochs,
            batch_size:     2,
            seq_len:        6,
            lr:             1e-3,
            num_workers:    1,
            preload:        preload.map(str::to_string),
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        let model_cfg = TransformerConfig::new(src.vocab_len(), tgt.vocab_len(), 6, 6)
            .with_d_model(8)
            .with_num_blocks(1)
            .with_num_heads(2)
            .with_d_ff(16)
            .with_dropout(0.0);

        let train = BilingualDataset::new(all[..4].to_vec(), src.clone(), tgt.clone(), 6).unwrap();
        let valid = BilingualDataset::new(all[4..].to_vec(), src, tgt, 6).unwrap();
        (cfg, model_cfg, train, valid)
    }

    #[test]
    fn test_training_writes_checkpoints_and_metrics() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let (cfg, model_cfg, train, valid) = setup(2, None, dir.path());

        let history = train_loop::<TestBackend, _, _>(
            &cfg, &model_cfg, train, valid, &ckpt, Default::default(),
        ).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.train_loss.is_finite() && m.val_loss.is_finite()));
        assert_eq!(ckpt.latest_epoch().unwrap(), Some(2));

        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_resume_continues_after_preloaded_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let (cfg, model_cfg, train, valid) = setup(1, None, dir.path());
        train_loop::<TestBackend, _, _>(&cfg, &model_cfg, train, valid, &ckpt, Default::default()).unwrap();

        let (cfg, model_cfg, train, valid) = setup(3, Some("latest"), dir.path());
        let history = train_loop::<TestBackend, _, _>(
            &cfg, &model_cfg, train, valid, &ckpt, Default::default(),
        ).unwrap();

        let epochs: Vec<usize> = history.iter().map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![2, 3]);
        assert_eq!(ckpt.latest_epoch().unwrap(), Some(3));
    }

    #[test]
    fn test_pad_rows_do_not_dilute_token_loss() {
        type B = NdArray;
        let device = Default::default();
        let pad    = 1u32;
        let loss   = loss_fn::<B>(pad, &device);

        let row = [0.5f32, -1.0, 2.0, 0.25];
        let one = token_mean_loss(
            &loss,
            Tensor::<B, 2>::from_floats([row], &device),
            Tensor::<B, 1, Int>::from_ints([2], &device),
            pad,
        );
        let padded = token_mean_loss(
            &loss,
            Tensor::<B, 2>::from_floats([row, row, row, row], &device),
            Tensor::<B, 1, Int>::from_ints([2, 1, 1, 1], &device),
            pad,
        );

        let one: f64    = one.into_scalar().elem();
        let padded: f64 = padded.into_scalar().elem();
        assert!(one > 0.0);
        assert!((one - padded).abs() < 1e-5, "{one} vs {padded}");
    }

    #[test]
    fn test_all_pad_batch_has_zero_loss() {
        type B = NdArray;
        let device = Default::default();
        let loss   = loss_fn::<B>(1, &device);

        let value = token_mean_loss(
            &loss,
            Tensor::<B, 2>::from_floats([[0.1f32, 0.2, 0.3], [0.3, 0.2, 0.1]], &device),
            Tensor::<B, 1, Int>::from_ints([1, 1], &device),
            1,
        );
        assert_eq!(value.into_scalar().elem::<f64>(), 0.0);
    }

    #[test]
    fn test_preload_without_checkpoint_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let (cfg, model_cfg, train, valid) = setup(1, Some("latest"), dir.path());

        let result = train_loop::<TestBackend, _, _>(&cfg, &model_cfg, train, valid, &ckpt, Default::default());
        assert!(result.is_err());
    }
}
