use anyhow::Result;
use clap::Parser;
use slice_vit::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slice_vit=info".parse()?),
        )
        .init();

    Cli::parse().run()
}
