// ============================================================
// Layer 4 - Slice Batcher
// ============================================================
// Stacks a list of exams into one padded batch:
//
//   Input:  N ExamSamples with T_1 .. T_N slices of width H
//   Output: features [N, T_max, H], zero rows after each exam's end
//           mask     [N, T_max],    1.0 = real slice, 0.0 = padding
//
// The mask feeds VisionTransformer::forward directly. A batch
// that cannot be stacked comes back as an error, not a panic.

use anyhow::{bail, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ExamSample;

#[derive(Debug, Clone)]
pub struct SliceBatch<B: Backend> {
    /// [batch_size, max_slices, hidden_size]
    pub features: Tensor<B, 3>,
    /// [batch_size, max_slices]
    pub mask:     Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct SliceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SliceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ExamSample, Result<SliceBatch<B>>> for SliceBatcher<B> {
    fn batch(&self, items: Vec<ExamSample>) -> Result<SliceBatch<B>> {
        let Some(first) = items.first() else {
            bail!("Cannot batch an empty list of exams");
        };
        let hidden = first.hidden_size;

        for item in &items {
            if item.hidden_size != hidden {
                bail!(
                    "Exam '{}' has hidden_size {} but the batch uses {}",
                    item.name, item.hidden_size, hidden
                );
            }
            if item.num_slices == 0 {
                bail!("Exam '{}' has no slices", item.name);
            }
        }

        let batch_size = items.len();
        let max_slices = items.iter().map(|s| s.num_slices).max().unwrap_or(0);

        let mut features = Vec::with_capacity(batch_size * max_slices * hidden);
        let mut mask     = Vec::with_capacity(batch_size * max_slices);
        for item in &items {
            let pad = max_slices - item.num_slices;
            features.extend_from_slice(&item.slices);
            features.extend(std::iter::repeat(0.0f32).take(pad * hidden));
            mask.extend(std::iter::repeat(1.0f32).take(item.num_slices));
            mask.extend(std::iter::repeat(0.0f32).take(pad));
        }

        tracing::debug!("Batched {} exams, padded to {} slices", batch_size, max_slices);

        Ok(SliceBatch {
            features: Tensor::from_data(
                TensorData::new(features, [batch_size, max_slices, hidden]),
                &self.device,
            ),
            mask: Tensor::from_data(TensorData::new(mask, [batch_size, max_slices]), &self.device),
        })
    }
}
