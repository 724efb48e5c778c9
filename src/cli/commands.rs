// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `translate` and `inspect`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a JSON-lines corpus
    Train(TrainArgs),

    /// Translate a sentence with a trained checkpoint
    Translate(TranslateArgs),

    /// Summarise a checkpoint: configuration and parameter counts
    Inspect(InspectArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON-lines corpus: {"translation": {"<lang_src>": ..., "<lang_tgt>": ...}}
    #[arg(long, default_value = "data/opus_books_en_it.jsonl")]
    pub corpus: String,

    /// Source language key in the corpus records
    #[arg(long, default_value = "en")]
    pub lang_src: String,

    /// Target language key in the corpus records
    #[arg(long, default_value = "it")]
    pub lang_tgt: String,

    /// Directory for checkpoints, tokenizers and metrics
    #[arg(long, default_value = "opus_books_weights")]
    pub checkpoint_dir: String,

    /// Resume from "latest" or from an epoch number
    #[arg(long)]
    pub preload: Option<String>,

    /// Fixed length of every encoder/decoder sequence, markers included
    #[arg(long, default_value_t = 350)]
    pub seq_len: usize,

    /// Number of sentence pairs per batch
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Last epoch to train (a resumed run continues up to it)
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Model width (d_model in the paper)
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    /// Number of encoder blocks and of decoder blocks (N)
    #[arg(long, default_value_t = 6)]
    pub num_blocks: usize,

    /// Attention heads (h); d_model must be divisible by it
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Inner dimension of the feed-forward blocks
    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Words seen fewer times than this map to [UNK]
    #[arg(long, default_value_t = 2)]
    pub min_frequency: usize,

    /// Share of the corpus used for training, the rest validates
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Seed for initialisation, the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:    a.corpus,
            lang_src:       a.lang_src,
            lang_tgt:       a.lang_tgt,
            checkpoint_dir: a.checkpoint_dir,
            preload:        a.preload,
            seq_len:        a.seq_len,
            batch_size:     a.batch_size,
            num_epochs:     a.epochs,
            lr:             a.lr,
            d_model:        a.d_model,
            num_blocks:     a.num_blocks,
            num_heads:      a.num_heads,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            min_frequency:  a.min_frequency,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            num_workers:    a.num_workers,
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// The sentence to translate
    #[arg(long)]
    pub text: String,

    /// Directory where the training run saved its checkpoints
    #[arg(long, default_value = "opus_books_weights")]
    pub checkpoint_dir: String,

    /// "latest" or an epoch number
    #[arg(long, default_value = "latest")]
    pub epoch: String,
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "opus_books_weights")]
    pub checkpoint_dir: String,

    /// "latest" or an epoch number
    #[arg(long, default_value = "latest")]
    pub epoch: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["translation-transformer", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let from_cli: TrainConfig = args.into();
        let default = TrainConfig::default();
        assert_eq!(
            serde_json::to_value(&from_cli).unwrap(),
            serde_json::to_value(&default).unwrap()
        );
    }

    #[test]
    fn test_train_flags_are_converted() {
        let cli = Cli::try_parse_from([
            "translation-transformer", "train",
            "--lang-src", "de", "--lang-tgt", "fr",
            "--epochs", "3", "--d-model", "64", "--num-heads", "4",
            "--preload", "latest",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.lang_src, "de");
        assert_eq!(cfg.lang_tgt, "fr");
        assert_eq!(cfg.num_epochs, 3);
        assert_eq!(cfg.d_model, 64);
        assert_eq!(cfg.num_heads, 4);
        assert_eq!(cfg.preload.as_deref(), Some("latest"));
    }

    #[test]
    fn test_translate_requires_text() {
        assert!(Cli::try_parse_from(["translation-transformer", "translate"]).is_err());

        let cli = Cli::try_parse_from([
            "translation-transformer", "translate", "--text", "Hello", "--epoch", "7",
        ]).unwrap();
        let Commands::Translate(args) = cli.command else { panic!("expected translate") };
        assert_eq!(args.text, "Hello");
        assert_eq!(args.epoch, "7");
        assert_eq!(args.checkpoint_dir, "opus_books_weights");
    }
}
