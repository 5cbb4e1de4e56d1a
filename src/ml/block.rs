// ============================================================
// Layer 5 - Encoder Block
// ============================================================
// Pre-norm residual transformer layer:
//
//   x = x + Attention(LayerNorm_0(x))
//   x = x + Mlp(LayerNorm_2(x))
//
// load_from() pulls this block's 16 tensors out of a pretrained
// table under "Transformer/encoderblock_<index>/…". The block
// stays untouched unless every tensor was found and has the
// right shape.

use burn::{nn::LayerNorm, prelude::*};

use crate::domain::error::VitResult;
use crate::domain::keys::BlockTensor;
use crate::domain::weights::WeightTable;
use crate::ml::attention::SelfAttention;
use crate::ml::config::VitConfig;
use crate::ml::import::{DenseTensors, NormTensors};
use crate::ml::mlp::Mlp;

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub attention_norm: LayerNorm<B>,
    pub attention:      SelfAttention<B>,
    pub ffn_norm:       LayerNorm<B>,
    pub ffn:            Mlp<B>,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        Self {
            attention_norm: cfg.init_norm(device),
            attention:      SelfAttention::new(cfg, device),
            ffn_norm:       cfg.init_norm(device),
            ffn:            Mlp::new(cfg, device),
        }
    }

    pub fn forward(
        &self,
        x:    Tensor<B, 3>,
        mask: Option<Tensor<B, 4>>,
    ) -> (Tensor<B, 3>, Option<Tensor<B, 4>>) {
        let (attn_out, weights) = self.attention.forward(self.attention_norm.forward(x.clone()), mask);
        let x = x + attn_out;

        let ffn_out = self.ffn.forward(self.ffn_norm.forward(x.clone()));
        (x + ffn_out, weights)
    }

    /// Overwrite every parameter of this block from `table`.
    pub fn load_from<T: WeightTable + ?Sized>(&mut self, table: &T, index: usize) -> VitResult<()> {
        // Fetch everything first so a bad key leaves the block as it was
        let heads = self.attention.head_layout();
        let query = DenseTensors::fetch(table, index, BlockTensor::Query, &self.attention.query, heads)?;
        let key   = DenseTensors::fetch(table, index, BlockTensor::Key, &self.attention.key, heads)?;
        let value = DenseTensors::fetch(table, index, BlockTensor::Value, &self.attention.value, heads)?;
        let out   = DenseTensors::fetch(table, index, BlockTensor::Out, &self.attention.out, heads)?;
        let fc1   = DenseTensors::fetch(table, index, BlockTensor::Dense0, &self.ffn.fc1, heads)?;
        let fc2   = DenseTensors::fetch(table, index, BlockTensor::Dense1, &self.ffn.fc2, heads)?;
        let attention_norm =
            NormTensors::fetch_block(table, index, BlockTensor::AttentionNorm, &self.attention_norm)?;
        let ffn_norm = NormTensors::fetch_block(table, index, BlockTensor::MlpNorm, &self.ffn_norm)?;

        query.assign_to(&mut self.attention.query);
        key.assign_to(&mut self.attention.key);
        value.assign_to(&mut self.attention.value);
        out.assign_to(&mut self.attention.out);
        fc1.assign_to(&mut self.ffn.fc1);
        fc2.assign_to(&mut self.ffn.fc2);
        attention_norm.assign_to(&mut self.attention_norm);
        ffn_norm.assign_to(&mut self.ffn_norm);

        tracing::debug!("Imported encoder block {}", index);
        Ok(())
    }
}
