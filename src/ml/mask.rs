// ============================================================
// Layer 5 - Attention Mask Preparation
// ============================================================
// Callers pass a 0/1 mask over the body positions, shape
// (B, T_body): 1 = real slice, 0 = padding. The encoder wants an
// additive bias over the whole sequence, shape (B, 1, 1, T):
//
//   1. prepend HEADER_TOKENS columns of 1 (headers always valid)
//   2. reshape to (B, 1, 1, HEADER_TOKENS + T_body)
//   3. invert: 1 - mask
//   4. multiply by the most negative value of the float dtype
//
// Valid positions end up at 0, padding at MIN.

use burn::{prelude::*, tensor::DType};

/// Most negative finite value representable in `dtype`.
pub fn dtype_min(dtype: DType) -> f64 {
    match dtype {
        DType::F64  => f64::MIN,
        DType::F16  => -65504.0,
        DType::BF16 => -3.389_531_4e38,
        _           => f32::MIN as f64,
    }
}

/// (B, T_body) 0/1 mask → (B, 1, 1, header_tokens + T_body) additive bias.
pub fn extended_attention_mask<B: Backend>(mask: Tensor<B, 2>, header_tokens: usize) -> Tensor<B, 4> {
    let [batch, body_len] = mask.dims();
    let device  = mask.device();
    let headers = Tensor::<B, 2>::ones([batch, header_tokens], &device);

    let mask = Tensor::cat(vec![headers, mask], 1).reshape([batch, 1, 1, header_tokens + body_len]);
    let min  = dtype_min(mask.dtype());
    mask.neg().add_scalar(1.0).mul_scalar(min)
}
