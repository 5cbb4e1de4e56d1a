// ============================================================
// Layer 2 - InferUseCase
// ============================================================
// Loads an imported checkpoint once, then scores every exam in
// a features file, batch_size exams per forward pass.

use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use std::path::{Path, PathBuf};

use crate::data::dataset::ExamDataset;
use crate::domain::prediction::ExamPrediction;
use crate::infra::{checkpoint::CheckpointManager, safetensors_store::load_exam_samples};
use crate::ml::inferencer::Inferencer;

pub struct InferUseCase {
    inferencer: Inferencer,
    batch_size: usize,
}

impl InferUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, batch_size: usize, visualize: bool) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch_size must be positive");
        }
        let ckpt       = CheckpointManager::new(checkpoint_dir)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt, visualize)?;
        Ok(Self { inferencer, batch_size })
    }

    pub fn run(&self, input: &Path) -> Result<Vec<ExamPrediction>> {
        let dataset = ExamDataset::new(load_exam_samples(input)?);
        if dataset.is_empty() {
            bail!("No exams found in '{}'", input.display());
        }

        let mut predictions = Vec::with_capacity(dataset.len());
        for batch in dataset.batches(self.batch_size) {
            predictions.extend(self.inferencer.predict(&batch)?);
        }
        tracing::info!("Scored {} exams", predictions.len());
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::import_use_case::{ImportConfig, ImportUseCase};
    use crate::domain::weights::WeightArray;
    use crate::infra::safetensors_store::save_weight_table;
    use crate::ml::testing::{synthetic_table, tiny_config};
    use std::collections::HashMap;

    #[test]
    fn test_import_then_infer() {
        let dir     = tempfile::tempdir().unwrap();
        let weights = dir.path().join("vit.safetensors");
        let ckpt    = dir.path().join("ckpt");
        let cfg     = tiny_config();
        save_weight_table(&weights, &synthetic_table(&cfg)).unwrap();
        ImportUseCase::new(ImportConfig { weights, checkpoint_dir: ckpt.clone(), model: cfg })
            .execute()
            .unwrap();

        let input = dir.path().join("exams.safetensors");
        let mut exams = HashMap::new();
        for (name, slices) in [("exam_0", 3), ("exam_1", 1), ("exam_2", 4)] {
            let data = (0..slices * 8).map(|i| (i as f32 * 0.1).cos()).collect();
            exams.insert(name.to_string(), WeightArray::new(vec![slices, 8], data).unwrap());
        }
        save_weight_table(&input, &exams).unwrap();

        let preds = InferUseCase::new(&ckpt, 2, false).unwrap().run(&input).unwrap();
        let names: Vec<&str> = preds.iter().map(|p| p.exam.as_str()).collect();
        assert_eq!(names, vec!["exam_0", "exam_1", "exam_2"]);
        assert_eq!(preds[2].num_slices, 4);
        assert!(preds.iter().all(|p| p.header_logits.iter().all(|l| l.is_finite())));
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InferUseCase::new(dir.path(), 4, false).is_err());
    }
}
