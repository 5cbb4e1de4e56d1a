// ============================================================
// Layer 5 - Inferencer
// ============================================================
use anyhow::{anyhow, bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::SliceBatcher;
use crate::data::dataset::ExamSample;
use crate::domain::prediction::ExamPrediction;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::config::{HEADER_TOKENS, NUM_HEADS_OUT};
use crate::ml::model::{VisionTransformer, VitOutput};

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

fn to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<Vec<f32>> {
    t.into_data().to_vec::<f32>().map_err(|e| anyhow!("Tensor readback failed: {e:?}"))
}

pub struct Inferencer<B: Backend = InferBackend> {
    model:   VisionTransformer<B>,
    batcher: SliceBatcher<B>,
}

impl Inferencer<InferBackend> {
    /// Rebuild the saved model; `visualize` overrides the saved flag.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, visualize: bool) -> Result<Self> {
        let device = <InferBackend as Backend>::Device::default();
        let (cfg, model) = ckpt_manager.restore::<InferBackend>(&device, visualize)?;
        tracing::info!(
            "Model loaded from checkpoint ({} layers, hidden {})",
            cfg.num_layers, cfg.hidden_size
        );
        Ok(Self::new(model, device))
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: VisionTransformer<B>, device: B::Device) -> Self {
        Self { model, batcher: SliceBatcher::new(device) }
    }

    /// One prediction per exam, in input order. Shorter exams are
    /// padded and masked, so batching never changes a result.
    pub fn predict(&self, samples: &[ExamSample]) -> Result<Vec<ExamPrediction>> {
        let batch = self.batcher.batch(samples.to_vec())?;
        let out   = self.model.forward(batch.features, Some(batch.mask));

        if let Some(focus) = self.attention_focus(&out, samples)? {
            for (sample, slice) in samples.iter().zip(focus) {
                tracing::info!("{}: summary attends most to slice {}", sample.name, slice);
            }
        }

        let batch_size = samples.len();
        let logits  = to_vec(Tensor::cat(out.header_logits, 1))?;
        let norms   = to_vec(out.summary.powf_scalar(2.0).sum_dim(1).sqrt())?;
        let per_exam = logits.len() / batch_size;
        let num_classes = per_exam / NUM_HEADS_OUT;

        Ok(samples
            .iter()
            .zip(logits.chunks(per_exam))
            .zip(norms)
            .map(|((sample, l), norm)| {
                ExamPrediction::new(&sample.name, l.to_vec(), num_classes, norm, sample.num_slices)
            })
            .collect())
    }

    /// Body slice receiving the most attention from the summary
    /// position in the last layer, averaged over heads.
    fn attention_focus(&self, out: &VitOutput<B>, samples: &[ExamSample]) -> Result<Option<Vec<usize>>> {
        let Some(last) = out.attention_weights.last() else {
            return Ok(None);
        };
        let [batch, heads, _, seq_len] = last.dims();
        if seq_len <= HEADER_TOKENS {
            bail!("Attention map has no body positions");
        }
        let body_len = seq_len - HEADER_TOKENS;

        let row = last
            .clone()
            .slice([0..batch, 0..heads, 0..1, HEADER_TOKENS..seq_len])
            .mean_dim(1)
            .reshape([batch, body_len]);
        let values = to_vec(row)?;

        Ok(Some(
            samples
                .iter()
                .zip(values.chunks(body_len))
                .map(|(sample, row)| {
                    row[..sample.num_slices]
                        .iter()
                        .enumerate()
                        .fold((0, f32::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
                        .0
                })
                .collect(),
        ))
    }
}
