// ============================================================
// Layer 5 - Header Embeddings
// ============================================================
// Inputs arrive already embedded: one hidden_size vector per
// slice. This stage only prepends the HEADER_TOKENS learned
// header vectors (zero at init), shared across the batch:
//
//   [B, T_body, H] → [B, HEADER_TOKENS + T_body, H]
//
// There is no patch projection and no positional embedding.

use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig},
    prelude::*,
};

use crate::ml::config::{VitConfig, HEADER_TOKENS};

#[derive(Module, Debug)]
pub struct HeaderEmbeddings<B: Backend> {
    /// [1, HEADER_TOKENS, H]
    pub header_tokens: Param<Tensor<B, 3>>,
    dropout:           Dropout,
    apply_dropout:     bool,
}

impl<B: Backend> HeaderEmbeddings<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        Self {
            header_tokens: Param::from_tensor(Tensor::zeros([1, HEADER_TOKENS, cfg.hidden_size], device)),
            dropout:       DropoutConfig::new(cfg.dropout_rate).init(),
            apply_dropout: cfg.embedding_dropout,
        }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, _, hidden] = x.dims();
        let headers = self.header_tokens.val().expand([batch, HEADER_TOKENS, hidden]);
        let x = Tensor::cat(vec![headers, x], 1);

        if self.apply_dropout {
            self.dropout.forward(x)
        } else {
            x
        }
    }
}
