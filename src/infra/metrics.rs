// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean label-smoothed cross-entropy over training batches
//   - val_loss:   mean cross-entropy over validation batches
//
// Output file: opus_books_weights/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss
//   1,6.912400,6.503100
//   2,5.880200,5.741900
//   ...
//
// A resumed run appends to the same file.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average loss over all training batches.
    /// Random initialisation gives roughly ln(tgt_vocab_size)
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,
}

impl EpochMetrics {
    /// Create a new EpochMetrics record
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir: PathBuf = dir.into();

        // Create directory if it doesn't exist
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write CSV header only if file is new
        // This allows appending to an existing log across runs
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            // Write the header row
            writeln!(f, "epoch,train_loss,val_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    ///
    /// Uses OpenOptions with append=true so we add to the file
    /// without overwriting previous epochs.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        // Open in append mode — adds to end of file
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        // Write one CSV row with 6 decimal places for each metric
        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Lowest val_loss logged for an epoch before `epoch`, if any.
    ///
    /// Rows at or after `epoch` belong to a run being overwritten by a
    /// resume from an earlier checkpoint and are ignored.
    pub fn best_val_loss_before(&self, epoch: usize) -> Result<Option<f64>> {
        let csv = fs::read_to_string(&self.csv_path)?;

        let best = csv
            .lines()
            .skip(1)
            .filter_map(|line| {
                let mut fields = line.split(',');
                let row_epoch  = fields.next()?.trim().parse::<usize>().ok()?;
                let val_loss   = fields.nth(1)?.trim().parse::<f64>().ok()?;
                (row_epoch < epoch && val_loss.is_finite()).then_some(val_loss)
            })
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.min(v))));

        Ok(best)
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3);
        // 2.3 < 3.0 → this is an improvement
        assert!(m.is_improvement(3.0));
        // 2.3 is NOT less than 2.0 → not an improvement
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_best_val_loss_only_counts_earlier_epochs() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        assert_eq!(logger.best_val_loss_before(5).unwrap(), None);

        logger.log(&EpochMetrics::new(1, 4.0, 3.5)).unwrap();
        logger.log(&EpochMetrics::new(2, 3.0, 2.5)).unwrap();
        logger.log(&EpochMetrics::new(3, 2.0, 1.5)).unwrap();

        assert_eq!(logger.best_val_loss_before(1).unwrap(), None);
        assert_eq!(logger.best_val_loss_before(3).unwrap(), Some(2.5));
        assert_eq!(logger.best_val_loss_before(4).unwrap(), Some(1.5));
    }

    #[test]
    fn test_rows_are_appended_across_loggers() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 4.0, 3.5)).unwrap();

        // A resumed run must not rewrite the header
        let resumed = MetricsLogger::new(dir.path()).unwrap();
        resumed.log(&EpochMetrics::new(2, 3.25, 3.125)).unwrap();

        let csv = fs::read_to_string(resumed.csv_path()).unwrap();
        assert_eq!(
            csv,
            "epoch,train_loss,val_loss\n1,4.000000,3.500000\n2,3.250000,3.125000\n"
        );
    }
}
