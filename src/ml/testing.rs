// Shared helpers for the model-layer unit tests.

use std::collections::HashMap;

use burn::prelude::*;

use crate::domain::keys::{block_key, encoder_norm_key, BlockTensor, Leaf};
use crate::domain::weights::WeightArray;
use crate::ml::config::VitConfig;

pub type TestBackend = burn::backend::NdArray;

pub fn to_vec<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
    t.into_data().to_vec().unwrap()
}

pub fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
    }
}

/// Deterministic, key-dependent values so every tensor differs.
fn filler(seed: usize, shape: Vec<usize>) -> WeightArray {
    let n: usize = shape.iter().product();
    let data = (0..n)
        .map(|i| (((seed * 131 + i * 17) % 101) as f32 / 101.0 - 0.5) * 0.2)
        .collect();
    WeightArray::new(shape, data).unwrap()
}

/// A complete table for `cfg`, laid out the way published
/// checkpoints are: per-head attention kernels and biases,
/// (in, out) dense kernels.
pub fn synthetic_table(cfg: &VitConfig) -> HashMap<String, WeightArray> {
    let (h, heads, hd, mlp) = (cfg.hidden_size, cfg.num_heads, cfg.head_size(), cfg.mlp_dim);
    let mut table = HashMap::new();
    let mut seed  = 0;
    let mut put = |key: String, shape: Vec<usize>| {
        seed += 1;
        table.insert(key, filler(seed, shape));
    };

    for b in 0..cfg.num_layers {
        for t in [BlockTensor::Query, BlockTensor::Key, BlockTensor::Value] {
            put(block_key(b, t, Leaf::Kernel), vec![h, heads, hd]);
            put(block_key(b, t, Leaf::Bias), vec![heads, hd]);
        }
        put(block_key(b, BlockTensor::Out, Leaf::Kernel), vec![heads, hd, h]);
        put(block_key(b, BlockTensor::Out, Leaf::Bias), vec![h]);
        put(block_key(b, BlockTensor::Dense0, Leaf::Kernel), vec![h, mlp]);
        put(block_key(b, BlockTensor::Dense0, Leaf::Bias), vec![mlp]);
        put(block_key(b, BlockTensor::Dense1, Leaf::Kernel), vec![mlp, h]);
        put(block_key(b, BlockTensor::Dense1, Leaf::Bias), vec![h]);
        for t in [BlockTensor::AttentionNorm, BlockTensor::MlpNorm] {
            put(block_key(b, t, Leaf::Scale), vec![h]);
            put(block_key(b, t, Leaf::Bias), vec![h]);
        }
    }
    put(encoder_norm_key(Leaf::Scale), vec![h]);
    put(encoder_norm_key(Leaf::Bias), vec![h]);
    table
}

/// Small config that keeps numeric tests fast.
pub fn tiny_config() -> VitConfig {
    VitConfig::new()
        .with_hidden_size(8)
        .with_mlp_dim(16)
        .with_num_heads(2)
        .with_num_layers(2)
}
