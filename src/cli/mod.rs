// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`     — trains the model on a bilingual corpus
//   2. `translate` — greedy-decodes a sentence with a checkpoint
//   3. `inspect`   — prints a checkpoint's parameter summary
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, TrainArgs, TranslateArgs};

use crate::domain::traits::Translator;

#[derive(Parser, Debug)]
#[command(
    name = "translation-transformer",
    version = "0.1.0",
    about = "Train an encoder-decoder Transformer on sentence pairs, then translate with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
            Commands::Inspect(args)   => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!(
        "Starting {}→{} training on '{}'",
        args.lang_src, args.lang_tgt, args.corpus
    );

    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Training complete. Checkpoints saved.");
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case    = TranslateUseCase::new(&args.checkpoint_dir, &args.epoch)?;
    let translation = use_case.translate(&args.text)?;
    println!("{translation}");
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(&args.checkpoint_dir)?.report(&args.epoch)?;
    println!("{report}");
    Ok(())
}
