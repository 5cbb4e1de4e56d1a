// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Persists an imported model with Burn's named MessagePack
// recorder at full precision.
//
//   checkpoints/
//     model.mpk         ← all parameters (MessagePack, f32)
//     vit_config.json   ← the VitConfig the model was built from
//
// Loading rebuilds the architecture from vit_config.json first,
// then restores the record into it. A record whose layout does
// not match the config fails to load.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FileRecorder, FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::ml::config::VitConfig;
use crate::ml::model::VisionTransformer;

const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "vit_config.json";

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the parameter record, extension included.
    pub fn model_file<B: Backend>(&self) -> PathBuf {
        let ext = <ModelRecorder as FileRecorder<B>>::file_extension();
        self.dir.join(MODEL_FILE).with_extension(ext)
    }

    /// Writes {dir}/model.mpk; the recorder adds the extension.
    pub fn save_model<B: Backend>(&self, model: &VisionTransformer<B>) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        ModelRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved model to '{}'", path.display());
        Ok(())
    }

    /// Restore saved weights into `model`, which must have been
    /// built from the saved config.
    pub fn load_model<B: Backend>(
        &self,
        model:  VisionTransformer<B>,
        device: &B::Device,
    ) -> Result<VisionTransformer<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = ModelRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you run 'import' first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &VitConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<VitConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'import' before 'infer'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Model rebuilt from the saved config with the saved weights;
    /// `visualize` overrides the saved flag.
    pub fn restore<B: Backend>(
        &self,
        device:    &B::Device,
        visualize: bool,
    ) -> Result<(VitConfig, VisionTransformer<B>)> {
        let cfg   = self.load_config()?.with_visualize(visualize);
        let model = cfg.init::<B>(device)?;
        let model = self.load_model(model, device)?;
        tracing::info!("Model restored from '{}'", self.dir.display());
        Ok((cfg, model))
    }
}
