// ============================================================
// Layer 4 - Exam Samples
// ============================================================
// One exam is an ordered stack of slices, each already reduced
// to a hidden_size feature vector by an upstream extractor.
// Samples are stored flat, row-major: slice i occupies
// slices[i * hidden_size .. (i + 1) * hidden_size].

use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSample {
    pub name:        String,
    pub slices:      Vec<f32>,
    pub num_slices:  usize,
    pub hidden_size: usize,
}

impl ExamSample {
    /// Fails when `slices` is not a whole number of feature vectors.
    pub fn new(name: impl Into<String>, slices: Vec<f32>, hidden_size: usize) -> Result<Self> {
        let name = name.into();
        if hidden_size == 0 {
            bail!("Exam '{name}': hidden_size must be positive");
        }
        if slices.len() % hidden_size != 0 {
            bail!(
                "Exam '{name}': {} values is not a multiple of hidden_size {hidden_size}",
                slices.len()
            );
        }
        let num_slices = slices.len() / hidden_size;
        Ok(Self { name, slices, num_slices, hidden_size })
    }
}

pub struct ExamDataset {
    samples: Vec<ExamSample>,
}

impl ExamDataset {
    pub fn new(samples: Vec<ExamSample>) -> Self { Self { samples } }

    /// Consecutive runs of at most `batch_size` samples, in order.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = Vec<ExamSample>> + '_ {
        let size = batch_size.max(1);
        (0..self.len()).step_by(size).map(move |start| {
            (start..(start + size).min(self.len()))
                .filter_map(|i| self.get(i))
                .collect()
        })
    }
}

impl Dataset<ExamSample> for ExamDataset {
    fn get(&self, index: usize) -> Option<ExamSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
