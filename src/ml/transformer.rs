// ============================================================
// Layer 5 - Transformer
// ============================================================
// Header embeddings followed by the encoder stack.
//   input [B, T_body, H] → encoded [B, HEADER_TOKENS + T_body, H]

use burn::prelude::*;

use crate::ml::config::VitConfig;
use crate::ml::embeddings::HeaderEmbeddings;
use crate::ml::encoder::Encoder;

#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    pub embeddings: HeaderEmbeddings<B>,
    pub encoder:    Encoder<B>,
}

impl<B: Backend> Transformer<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        Self {
            embeddings: HeaderEmbeddings::new(cfg, device),
            encoder:    Encoder::new(cfg, device),
        }
    }

    /// `mask` must already be the additive (B, 1, 1, T) bias
    /// covering the header positions.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        mask:  Option<Tensor<B, 4>>,
    ) -> (Tensor<B, 3>, Vec<Tensor<B, 4>>) {
        let embedded = self.embeddings.forward(input);
        self.encoder.forward(embedded, mask)
    }
}
