// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands: `summarize`, `import` and `infer`.
// Architecture flags are shared through ModelArgs.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::import_use_case::ImportConfig;
use crate::domain::presets::preset;
use crate::ml::config::VitConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the model for a config and print its parameter layout
    Summarize(ModelArgs),

    /// Import pretrained ViT encoder weights into a checkpoint
    Import(ImportArgs),

    /// Score exams from a features file with an imported checkpoint
    Infer(InferArgs),
}

/// Architecture selection. Without a preset the built-in
/// defaults apply (6144 wide, 1024 mlp, 2 heads, 2 layers).
/// Each size flag overrides only its own field.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Named architecture, e.g. ViT-B_16, ViT-L_32, R50-ViT-B_16, testing
    #[arg(long)]
    pub preset: Option<String>,

    /// Width of one slice feature vector [default: 6144]
    #[arg(long)]
    pub hidden_size: Option<usize>,

    /// Inner dimension of the feed-forward block [default: 1024]
    #[arg(long)]
    pub mlp_dim: Option<usize>,

    /// Attention heads; must divide hidden_size [default: 2]
    #[arg(long)]
    pub num_heads: Option<usize>,

    /// Stacked encoder blocks [default: 2]
    #[arg(long)]
    pub num_layers: Option<usize>,

    /// Outputs per classification head [default: 1]
    #[arg(long)]
    pub num_classes: Option<usize>,
}

impl TryFrom<ModelArgs> for VitConfig {
    type Error = anyhow::Error;

    fn try_from(a: ModelArgs) -> anyhow::Result<Self> {
        let mut cfg = match a.preset.as_deref() {
            Some(name) => {
                let p = preset(name)?;
                tracing::info!("Preset {}: patches {:?}, backbone {:?}", p.name, p.patches, p.resnet);
                VitConfig::from_preset(&p)
            }
            None => VitConfig::new(),
        };
        if let Some(v) = a.hidden_size { cfg = cfg.with_hidden_size(v); }
        if let Some(v) = a.mlp_dim     { cfg = cfg.with_mlp_dim(v); }
        if let Some(v) = a.num_heads   { cfg = cfg.with_num_heads(v); }
        if let Some(v) = a.num_layers  { cfg = cfg.with_num_layers(v); }
        if let Some(v) = a.num_classes { cfg = cfg.with_num_classes(v); }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Pretrained weights in safetensors format
    #[arg(long)]
    pub weights: PathBuf,

    /// Directory to write the checkpoint into
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Zero the classification heads instead of keeping their init
    #[arg(long)]
    pub zero_head: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = anyhow::Error;

    fn try_from(a: ImportArgs) -> anyhow::Result<Self> {
        let model = VitConfig::try_from(a.model)?.with_zero_head(a.zero_head);
        Ok(ImportConfig { weights: a.weights, checkpoint_dir: a.checkpoint_dir, model })
    }
}

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Directory written by `import`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Exam features: one (num_slices, hidden_size) tensor per exam
    #[arg(long)]
    pub input: PathBuf,

    /// Exams per forward pass
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Probability at which a header counts as positive
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f32,

    /// Log which slice the summary position attends to most
    #[arg(long)]
    pub visualize: bool,

    /// Print predictions as JSON lines
    #[arg(long)]
    pub json: bool,
}
