// ============================================================
// Layer 2 - SummarizeUseCase
// ============================================================
// Builds a model from a config and reports its layout without
// touching any weights on disk.

use anyhow::Result;
use burn::module::Module;

use crate::ml::config::{VitConfig, HEADER_TOKENS, NUM_HEADS_OUT};
use crate::ml::inferencer::InferBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub header_params:  usize,
    pub block_params:   Vec<usize>,
    pub norm_params:    usize,
    pub head_params:    usize,
    pub total_params:   usize,
}

pub fn summarize(cfg: &VitConfig) -> Result<ModelSummary> {
    let device = <InferBackend as burn::prelude::Backend>::Device::default();
    let model  = cfg.init::<InferBackend>(&device)?;

    let encoder = &model.transformer.encoder;
    let summary = ModelSummary {
        header_params: model.transformer.embeddings.num_params(),
        block_params:  encoder.blocks.iter().map(|b| b.num_params()).collect(),
        norm_params:   encoder.encoder_norm.num_params(),
        head_params:   model.heads.iter().map(|h| h.num_params()).sum(),
        total_params:  model.num_params(),
    };

    tracing::info!(
        "{} header tokens, {} encoder blocks, {} heads ({} outputs each)",
        HEADER_TOKENS, cfg.num_layers, NUM_HEADS_OUT, cfg.num_classes
    );
    for (i, n) in summary.block_params.iter().enumerate() {
        tracing::debug!("encoderblock_{i}: {n} params");
    }
    Ok(summary)
}
