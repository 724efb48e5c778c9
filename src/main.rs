use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use translation_transformer::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("translation_transformer=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
