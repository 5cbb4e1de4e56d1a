// ============================================================
// Layer 3 - External Weights
// ============================================================
// Pretrained checkpoints come from a foreign framework and are
// handed to us as a flat name → array mapping, e.g.
//
//   "Transformer/encoderblock_3/MultiHeadDotProductAttention_1/query/kernel"
//       → f32 array of shape (hidden, heads, head_size)
//
// WeightArray is that raw array: row-major f32 data plus a shape.
// WeightTable is the read-only capability the model imports from.
// Neither type knows anything about Burn or about files.
//
// Layout conventions of the foreign store:
//   dense kernels   (in_features, out_features)
//   conv kernels    (H, W, in_channels, out_channels)  "HWIO"

use std::collections::HashMap;

use crate::domain::error::{VitError, VitResult};

/// A raw numeric array in the foreign (row-major) layout.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightArray {
    shape: Vec<usize>,
    data:  Vec<f32>,
}

impl WeightArray {
    /// Build an array, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> VitResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(VitError::DataLength { len: data.len(), shape });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// The raw data, if the array is stored in one of `layouts`.
    ///
    /// Shapes are compared exactly. Callers list every layout they
    /// accept for a tensor, e.g. `(H, H)` and the per-head
    /// `(H, heads, head_size)` for an attention kernel; row-major
    /// data of either flattens to the same matrix.
    pub fn data_in(&self, layouts: &[Vec<usize>]) -> Option<&[f32]> {
        layouts
            .iter()
            .any(|layout| layout.as_slice() == self.shape.as_slice())
            .then_some(self.data.as_slice())
    }

    /// Transpose a 2-D array. Errors for any other rank.
    pub fn transpose_2d(&self) -> VitResult<Self> {
        let [rows, cols] = self.shape[..] else {
            return Err(VitError::InvalidConfig(format!(
                "transpose_2d expects a 2-D array, got shape {:?}",
                self.shape
            )));
        };
        let mut out = vec![0.0f32; self.numel()];
        for r in 0..rows {
            for c in 0..cols {
                out[c * rows + r] = self.data[r * cols + c];
            }
        }
        Ok(Self { shape: vec![cols, rows], data: out })
    }

    /// Convert a convolution kernel from HWIO to OIHW.
    pub fn hwio_to_oihw(&self) -> VitResult<Self> {
        let [h, w, i, o] = self.shape[..] else {
            return Err(VitError::InvalidConfig(format!(
                "hwio_to_oihw expects a 4-D array, got shape {:?}",
                self.shape
            )));
        };
        let mut out = vec![0.0f32; self.numel()];
        for hh in 0..h {
            for ww in 0..w {
                for ii in 0..i {
                    for oo in 0..o {
                        let src = ((hh * w + ww) * i + ii) * o + oo;
                        let dst = ((oo * i + ii) * h + hh) * w + ww;
                        out[dst] = self.data[src];
                    }
                }
            }
        }
        Ok(Self { shape: vec![o, i, h, w], data: out })
    }
}

// ─── WeightTable ──────────────────────────────────────────────────────────────
/// Read-only lookup into an externally supplied set of weights.
///
/// Implementations:
///   - HashMap<String, WeightArray> → in-memory table (tests, safetensors loader)
pub trait WeightTable {
    fn get(&self, key: &str) -> Option<&WeightArray>;

    /// Like `get`, but a missing key is an error.
    fn require(&self, key: &str) -> VitResult<&WeightArray> {
        self.get(key).ok_or_else(|| VitError::MissingKey(key.to_string()))
    }
}

impl WeightTable for HashMap<String, WeightArray> {
    fn get(&self, key: &str) -> Option<&WeightArray> {
        HashMap::get(self, key)
    }
}
