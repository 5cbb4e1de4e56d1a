// ============================================================
// Layer 5 - Encoder Stack
// ============================================================
// num_layers EncoderBlocks applied in order, then one final
// LayerNorm ("encoder_norm"). Each block comes from its own
// EncoderBlock::new call, so no two blocks share a parameter.

use burn::{nn::LayerNorm, prelude::*};

use crate::domain::error::{VitError, VitResult};
use crate::domain::keys::{block_keys, encoder_norm_key, Leaf};
use crate::domain::weights::WeightTable;
use crate::ml::block::EncoderBlock;
use crate::ml::config::VitConfig;
use crate::ml::import::NormTensors;

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub blocks:       Vec<EncoderBlock<B>>,
    pub encoder_norm: LayerNorm<B>,
    visualize:        bool,
}

impl<B: Backend> Encoder<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        let blocks = (0..cfg.num_layers)
            .map(|_| EncoderBlock::new(cfg, device))
            .collect();
        Self {
            blocks,
            encoder_norm: cfg.init_norm(device),
            visualize:    cfg.visualize,
        }
    }

    /// Returns the normalized sequence and, when visualizing, one
    /// attention tensor per block in block order.
    pub fn forward(
        &self,
        hidden_states: Tensor<B, 3>,
        mask:          Option<Tensor<B, 4>>,
    ) -> (Tensor<B, 3>, Vec<Tensor<B, 4>>) {
        let mut x = hidden_states;
        let mut attention_weights = Vec::new();

        for block in &self.blocks {
            let (next, weights) = block.forward(x, mask.clone());
            x = next;
            if self.visualize {
                attention_weights.extend(weights);
            }
        }

        (self.encoder_norm.forward(x), attention_weights)
    }

    /// Import the final norm, then each block under its own index.
    ///
    /// Every key is checked for presence before anything is
    /// assigned, so a missing tensor leaves the whole stack as it was.
    pub fn load_from<T: WeightTable + ?Sized>(&mut self, table: &T) -> VitResult<()> {
        let norm_keys = [encoder_norm_key(Leaf::Scale), encoder_norm_key(Leaf::Bias)];
        let missing = norm_keys
            .into_iter()
            .chain((0..self.blocks.len()).flat_map(block_keys))
            .find(|key| table.get(key).is_none());
        if let Some(key) = missing {
            return Err(VitError::MissingKey(key));
        }

        NormTensors::fetch(
            table,
            &encoder_norm_key(Leaf::Scale),
            &encoder_norm_key(Leaf::Bias),
            &self.encoder_norm,
        )?
        .assign_to(&mut self.encoder_norm);

        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.load_from(table, index)?;
        }
        Ok(())
    }
}
