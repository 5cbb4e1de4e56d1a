// ============================================================
// Layer 5 - Weight Import Helpers
// ============================================================
// Turns entries of an external WeightTable into Burn tensors of
// exactly the shape a destination parameter already has, then
// swaps them into the module.
//
// Accepted layouts, by role (H = hidden, h = heads, d = head_size):
//   query/key/value kernel   (H, H) or (H, h, d)
//   query/key/value bias     (H)    or (h, d)
//   out kernel               (H, H) or (h, d, H)
//   out bias                 (H)
//   Dense_0 / Dense_1 kernel (in, out)
//   Dense_0 / Dense_1 bias   (out)
//   norm scale / bias        (H)
// Burn's Linear already stores [d_input, d_output], i.e. the
// transpose of an output-major (out, in) weight, so kernel data
// lands without a copy-transpose. Every other shape is a
// ShapeMismatch, even when the element count matches.
//
// Fetching is split from assigning: callers gather every tensor
// a module needs first, and only then overwrite parameters.

use burn::{
    module::Param,
    nn::{LayerNorm, Linear},
    prelude::*,
};

use crate::domain::error::{VitError, VitResult};
use crate::domain::keys::{block_key, BlockTensor, Leaf};
use crate::domain::weights::WeightTable;

/// Head split of the attention projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadLayout {
    pub num_heads: usize,
    pub head_size: usize,
}

/// Every shape `tensor`'s `leaf` may be stored in. The first entry
/// is the destination shape `dims` itself.
pub fn layouts(tensor: BlockTensor, leaf: Leaf, dims: &[usize], heads: HeadLayout) -> Vec<Vec<usize>> {
    let HeadLayout { num_heads: h, head_size: d } = heads;
    let mut accepted = vec![dims.to_vec()];
    match (tensor, leaf, dims) {
        (BlockTensor::Query | BlockTensor::Key | BlockTensor::Value, Leaf::Kernel, &[rows, _]) => {
            accepted.push(vec![rows, h, d]);
        }
        (BlockTensor::Query | BlockTensor::Key | BlockTensor::Value, Leaf::Bias, _) => {
            accepted.push(vec![h, d]);
        }
        (BlockTensor::Out, Leaf::Kernel, &[_, cols]) => {
            accepted.push(vec![h, d, cols]);
        }
        _ => {}
    }
    accepted
}

fn read<'a, T: WeightTable + ?Sized>(
    table:    &'a T,
    key:      &str,
    accepted: &[Vec<usize>],
) -> VitResult<&'a [f32]> {
    let array = table.require(key)?;
    array.data_in(accepted).ok_or_else(|| VitError::ShapeMismatch {
        key:      key.to_string(),
        expected: accepted[0].clone(),
        actual:   array.shape().to_vec(),
    })
}

/// Read a dense kernel as a `[d_in, d_out]` tensor.
pub fn kernel<B: Backend, T: WeightTable + ?Sized>(
    table:    &T,
    key:      &str,
    dims:     [usize; 2],
    accepted: &[Vec<usize>],
    device:   &B::Device,
) -> VitResult<Tensor<B, 2>> {
    let data = read(table, key, accepted)?;
    Ok(Tensor::from_data(TensorData::new(data.to_vec(), dims), device))
}

/// Read a bias or norm parameter as a `[len]` tensor.
pub fn vector<B: Backend, T: WeightTable + ?Sized>(
    table:    &T,
    key:      &str,
    len:      usize,
    accepted: &[Vec<usize>],
    device:   &B::Device,
) -> VitResult<Tensor<B, 1>> {
    let data = read(table, key, accepted)?;
    Ok(Tensor::from_data(TensorData::new(data.to_vec(), [len]), device))
}

// ─── Dense layers ─────────────────────────────────────────────────────────────
/// Kernel and bias fetched for one Linear, not yet assigned.
pub struct DenseTensors<B: Backend> {
    pub weight: Tensor<B, 2>,
    pub bias:   Tensor<B, 1>,
}

impl<B: Backend> DenseTensors<B> {
    /// Fetch `<tensor>/kernel` and `<tensor>/bias` of block `block`,
    /// shaped like `linear`.
    pub fn fetch<T: WeightTable + ?Sized>(
        table:  &T,
        block:  usize,
        tensor: BlockTensor,
        linear: &Linear<B>,
        heads:  HeadLayout,
    ) -> VitResult<Self> {
        let dims   = linear.weight.val().dims();
        let device = linear.weight.val().device();
        Ok(Self {
            weight: kernel(
                table,
                &block_key(block, tensor, Leaf::Kernel),
                dims,
                &layouts(tensor, Leaf::Kernel, &dims, heads),
                &device,
            )?,
            bias: vector(
                table,
                &block_key(block, tensor, Leaf::Bias),
                dims[1],
                &layouts(tensor, Leaf::Bias, &[dims[1]], heads),
                &device,
            )?,
        })
    }

    pub fn assign_to(self, linear: &mut Linear<B>) {
        linear.weight = Param::from_tensor(self.weight);
        linear.bias   = Some(Param::from_tensor(self.bias));
    }
}

// ─── Norms ────────────────────────────────────────────────────────────────────
/// Scale and bias fetched for one LayerNorm, not yet assigned.
pub struct NormTensors<B: Backend> {
    pub scale: Tensor<B, 1>,
    pub bias:  Tensor<B, 1>,
}

impl<B: Backend> NormTensors<B> {
    /// Fetch a norm stored under the given scale/bias keys; both
    /// must be exactly `[d_model]`.
    pub fn fetch<T: WeightTable + ?Sized>(
        table:     &T,
        scale_key: &str,
        bias_key:  &str,
        norm:      &LayerNorm<B>,
    ) -> VitResult<Self> {
        let [d]    = norm.gamma.val().dims();
        let device = norm.gamma.val().device();
        let exact  = [vec![d]];
        Ok(Self {
            scale: vector(table, scale_key, d, &exact, &device)?,
            bias:  vector(table, bias_key, d, &exact, &device)?,
        })
    }

    /// Fetch the `LayerNorm_*` of block `block`.
    pub fn fetch_block<T: WeightTable + ?Sized>(
        table:  &T,
        block:  usize,
        tensor: BlockTensor,
        norm:   &LayerNorm<B>,
    ) -> VitResult<Self> {
        Self::fetch(
            table,
            &block_key(block, tensor, Leaf::Scale),
            &block_key(block, tensor, Leaf::Bias),
            norm,
        )
    }

    pub fn assign_to(self, norm: &mut LayerNorm<B>) {
        norm.gamma = Param::from_tensor(self.scale);
        norm.beta  = Param::from_tensor(self.bias);
    }
}
