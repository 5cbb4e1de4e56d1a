// ============================================================
// Layer 2 - ImportUseCase
// ============================================================
// Turns a published checkpoint into a ready-to-run model:
//
//   Step 1: Validate the config and build the model   (Layer 5 - ml)
//   Step 2: Read the weight table                     (Layer 6 - infra)
//   Step 3: Copy encoder weights into the model       (Layer 5 - ml)
//   Step 4: Save config + model record                (Layer 6 - infra)
//
// A failed import leaves the checkpoint directory without a model.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::infra::{checkpoint::CheckpointManager, safetensors_store::load_weight_table};
use crate::ml::config::VitConfig;
use crate::ml::inferencer::InferBackend;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub weights:        PathBuf,
    pub checkpoint_dir: PathBuf,
    pub model:          VitConfig,
}

/// What an import did, for the CLI to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub tensors_read:    usize,
    pub blocks_imported: usize,
}

pub struct ImportUseCase {
    config: ImportConfig,
}

impl ImportUseCase {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ImportReport> {
        let cfg    = &self.config.model;
        let device = <InferBackend as burn::prelude::Backend>::Device::default();

        let mut model = cfg.init::<InferBackend>(&device)?;
        tracing::info!(
            "Built model: hidden {}, mlp {}, {} heads, {} layers",
            cfg.hidden_size, cfg.mlp_dim, cfg.num_heads, cfg.num_layers
        );

        let table = load_weight_table(&self.config.weights)?;
        model.load_from(&table).with_context(|| {
            format!("Weights in '{}' do not fit this model", self.config.weights.display())
        })?;

        let ckpt = CheckpointManager::new(&self.config.checkpoint_dir)?;
        ckpt.save_config(cfg)?;
        ckpt.save_model(&model)?;
        tracing::info!("Checkpoint written to '{}'", ckpt.dir().display());

        Ok(ImportReport { tensors_read: table.len(), blocks_imported: cfg.num_layers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys::{block_key, BlockTensor, Leaf};
    use crate::infra::safetensors_store::save_weight_table;
    use crate::ml::testing::{synthetic_table, tiny_config};

    #[test]
    fn test_import_writes_checkpoint() {
        let dir     = tempfile::tempdir().unwrap();
        let weights = dir.path().join("vit.safetensors");
        let cfg     = tiny_config();
        save_weight_table(&weights, &synthetic_table(&cfg)).unwrap();

        let report = ImportUseCase::new(ImportConfig {
            weights,
            checkpoint_dir: dir.path().join("ckpt"),
            model:          cfg,
        })
        .execute()
        .unwrap();

        assert_eq!(report, ImportReport { tensors_read: 2 * 16 + 2, blocks_imported: 2 });
        let ckpt = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        assert!(ckpt.model_file::<InferBackend>().exists());
        assert!(dir.path().join("ckpt/vit_config.json").exists());
    }

    #[test]
    fn test_incomplete_weights_write_no_model() {
        let dir     = tempfile::tempdir().unwrap();
        let weights = dir.path().join("vit.safetensors");
        let cfg     = tiny_config();
        let mut table = synthetic_table(&cfg);
        table.remove(&block_key(0, BlockTensor::Value, Leaf::Bias));
        save_weight_table(&weights, &table).unwrap();

        let result = ImportUseCase::new(ImportConfig {
            weights,
            checkpoint_dir: dir.path().join("ckpt"),
            model:          cfg,
        })
        .execute();

        assert!(result.is_err());
        let ckpt = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        assert!(!ckpt.model_file::<InferBackend>().exists());
    }
}
