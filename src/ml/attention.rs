// ============================================================
// Layer 5 - Multi-Head Self-Attention
// ============================================================
//   Q, K, V = xW_q + b_q, xW_k + b_k, xW_v + b_v     [B, T, H]
//   split heads                                      [B, h, T, d]
//   scores  = QKᵀ / √d  (+ additive mask)           [B, h, T, T]
//   probs   = softmax(scores) over keys
//   context = probs · V, heads merged                [B, T, H]
//   out     = context W_o + b_o
//
// The mask is (B, 1, 1, T): 0 for attended keys and the float
// type's minimum for excluded keys, so excluded probabilities
// underflow to 0 without producing NaN.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::config::VitConfig;
use crate::ml::import::HeadLayout;

#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    pub query:    Linear<B>,
    pub key:      Linear<B>,
    pub value:    Linear<B>,
    pub out:      Linear<B>,
    attn_dropout: Dropout,
    proj_dropout: Dropout,
    num_heads:    usize,
    head_size:    usize,
    visualize:    bool,
}

impl<B: Backend> SelfAttention<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        let hidden   = cfg.hidden_size;
        let all_head = cfg.num_heads * cfg.head_size();
        Self {
            query:        LinearConfig::new(hidden, all_head).init(device),
            key:          LinearConfig::new(hidden, all_head).init(device),
            value:        LinearConfig::new(hidden, all_head).init(device),
            out:          LinearConfig::new(hidden, hidden).init(device),
            attn_dropout: DropoutConfig::new(cfg.attention_dropout_rate).init(),
            proj_dropout: DropoutConfig::new(cfg.attention_dropout_rate).init(),
            num_heads:    cfg.num_heads,
            head_size:    cfg.head_size(),
            visualize:    cfg.visualize,
        }
    }

    pub fn head_layout(&self) -> HeadLayout {
        HeadLayout { num_heads: self.num_heads, head_size: self.head_size }
    }

    /// [B, T, H] → [B, heads, T, head_size]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, seq_len, _] = x.dims();
        x.reshape([batch, seq_len, self.num_heads, self.head_size])
            .swap_dims(1, 2)
    }

    /// x: [B, T, H], mask: [B, 1, 1, T] → ([B, T, H], probs [B, heads, T, T] if visualizing)
    pub fn forward(
        &self,
        x:    Tensor<B, 3>,
        mask: Option<Tensor<B, 4>>,
    ) -> (Tensor<B, 3>, Option<Tensor<B, 4>>) {
        let [batch, seq_len, _] = x.dims();

        let q = self.split_heads(self.query.forward(x.clone()));
        let k = self.split_heads(self.key.forward(x.clone()));
        let v = self.split_heads(self.value.forward(x));

        let scores = q.matmul(k.swap_dims(2, 3)).div_scalar((self.head_size as f64).sqrt());

        // Broadcast the per-key bias over heads and query rows
        let scores = match mask {
            Some(mask) => scores + mask.expand([batch, self.num_heads, seq_len, seq_len]),
            None       => scores,
        };

        let probs   = softmax(scores, 3);
        let weights = self.visualize.then(|| probs.clone());
        let probs   = self.attn_dropout.forward(probs);

        let context = probs
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, seq_len, self.num_heads * self.head_size]);

        let output = self.proj_dropout.forward(self.out.forward(context));
        (output, weights)
    }
}
