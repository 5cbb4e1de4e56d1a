// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case. All printing happens here.
//
//   1. `summarize` - parameter layout of a config
//   2. `import`    - pretrained weights → checkpoint
//   3. `infer`     - checkpoint + exam features → predictions

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ImportArgs, InferArgs, ModelArgs};

use crate::ml::config::VitConfig;

#[derive(Parser, Debug)]
#[command(
    name = "slice-vit",
    version = "0.1.0",
    about = "Multi-header vision transformer over per-slice exam features."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Summarize(args) => run_summarize(args),
            Commands::Import(args)    => run_import(args),
            Commands::Infer(args)     => run_infer(args),
        }
    }
}

fn run_summarize(args: ModelArgs) -> Result<()> {
    use crate::application::summarize_use_case::summarize;

    let cfg = VitConfig::try_from(args)?;
    let s   = summarize(&cfg)?;

    println!("header tokens : {:>12}", s.header_params);
    for (i, n) in s.block_params.iter().enumerate() {
        println!("encoderblock_{i:<2}: {n:>12}");
    }
    println!("encoder_norm  : {:>12}", s.norm_params);
    println!("heads         : {:>12}", s.head_params);
    println!("total         : {:>12}", s.total_params);
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<()> {
    use crate::application::import_use_case::ImportUseCase;

    tracing::info!("Importing weights from: {}", args.weights.display());
    let report = ImportUseCase::new(args.try_into()?).execute()?;

    println!(
        "Imported {} encoder blocks from {} tensors. Checkpoint saved.",
        report.blocks_imported, report.tensors_read
    );
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    use crate::application::infer_use_case::InferUseCase;

    let use_case    = InferUseCase::new(&args.checkpoint_dir, args.batch_size, args.visualize)?;
    let predictions = use_case.run(&args.input)?;

    for p in &predictions {
        if args.json {
            println!("{}", serde_json::to_string(p)?);
        } else {
            let probs: Vec<String> = p.probabilities().iter().map(|x| format!("{x:.3}")).collect();
            println!(
                "{}  slices={}  |summary|={:.3}  p=[{}]  positive={:?}",
                p.exam, p.num_slices, p.summary_norm, probs.join(", "), p.positive_headers(args.threshold)
            );
        }
    }
    Ok(())
}
