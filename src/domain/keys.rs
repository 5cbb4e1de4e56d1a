// ============================================================
// Layer 3 - External Weight Key Scheme
// ============================================================
// Pure mapping from (block index, tensor role) to the key a
// pretrained table stores that tensor under:
//
//   Transformer/encoderblock_<i>/MultiHeadDotProductAttention_1/{query,key,value,out}/{kernel,bias}
//   Transformer/encoderblock_<i>/MlpBlock_3/Dense_{0,1}/{kernel,bias}
//   Transformer/encoderblock_<i>/LayerNorm_0/{scale,bias}   (before attention)
//   Transformer/encoderblock_<i>/LayerNorm_2/{scale,bias}   (before the MLP)
//   Transformer/encoder_norm/{scale,bias}

/// A sub-layer of an encoder block that owns imported tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTensor {
    Query,
    Key,
    Value,
    Out,
    Dense0,
    Dense1,
    AttentionNorm,
    MlpNorm,
}

/// The leaf name of a tensor within its sub-layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Kernel,
    Bias,
    Scale,
}

impl BlockTensor {
    pub const ALL: [BlockTensor; 8] = [
        BlockTensor::Query,
        BlockTensor::Key,
        BlockTensor::Value,
        BlockTensor::Out,
        BlockTensor::Dense0,
        BlockTensor::Dense1,
        BlockTensor::AttentionNorm,
        BlockTensor::MlpNorm,
    ];

    fn path(self) -> &'static str {
        match self {
            BlockTensor::Query         => "MultiHeadDotProductAttention_1/query",
            BlockTensor::Key           => "MultiHeadDotProductAttention_1/key",
            BlockTensor::Value         => "MultiHeadDotProductAttention_1/value",
            BlockTensor::Out           => "MultiHeadDotProductAttention_1/out",
            BlockTensor::Dense0        => "MlpBlock_3/Dense_0",
            BlockTensor::Dense1        => "MlpBlock_3/Dense_1",
            BlockTensor::AttentionNorm => "LayerNorm_0",
            BlockTensor::MlpNorm       => "LayerNorm_2",
        }
    }

    /// Norms carry (scale, bias); dense layers carry (kernel, bias).
    pub fn leaves(self) -> [Leaf; 2] {
        match self {
            BlockTensor::AttentionNorm | BlockTensor::MlpNorm => [Leaf::Scale, Leaf::Bias],
            _ => [Leaf::Kernel, Leaf::Bias],
        }
    }
}

impl Leaf {
    fn name(self) -> &'static str {
        match self {
            Leaf::Kernel => "kernel",
            Leaf::Bias   => "bias",
            Leaf::Scale  => "scale",
        }
    }
}

const ROOT: &str = "Transformer";

/// Key of one tensor inside encoder block `block`.
pub fn block_key(block: usize, tensor: BlockTensor, leaf: Leaf) -> String {
    format!("{ROOT}/encoderblock_{block}/{}/{}", tensor.path(), leaf.name())
}

/// Key of the final encoder normalization's scale or bias.
pub fn encoder_norm_key(leaf: Leaf) -> String {
    format!("{ROOT}/encoder_norm/{}", leaf.name())
}

/// Every key a single block import reads, in import order (16 keys).
pub fn block_keys(block: usize) -> Vec<String> {
    BlockTensor::ALL
        .iter()
        .flat_map(|&t| t.leaves().map(|leaf| block_key(block, t, leaf)))
        .collect()
}
