// ============================================================
// Layer 5 - Classification Model
// ============================================================
// Mask preparation, the transformer, and the header split:
//   (1) a 0/1 slice mask becomes the additive attention bias
//   (2) the encoded sequence is cut into headers and body
//   (3) headers 1..=9 each go through their own linear head

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::error::VitResult;
use crate::domain::weights::WeightTable;
use crate::ml::config::{VitConfig, HEADER_TOKENS, NUM_HEADS_OUT};
use crate::ml::mask::extended_attention_mask;
use crate::ml::transformer::Transformer;

/// Multi-header ViT over per-slice features.
///
/// The encoded sequence is split at HEADER_TOKENS:
///   position 0       → returned raw as the body summary      [B, H]
///   positions 1..=9  → nine independent heads H → num_classes
///   positions 10..   → returned raw as body features         [B, T_body, H]
#[derive(Module, Debug)]
pub struct VisionTransformer<B: Backend> {
    pub transformer: Transformer<B>,
    pub heads:       Vec<Linear<B>>,
    zero_head:       bool,
}

pub struct VitOutput<B: Backend> {
    /// Header position 0: [B, H]
    pub summary:           Tensor<B, 2>,
    /// Heads 1..=9, each [B, num_classes]
    pub header_logits:     Vec<Tensor<B, 2>>,
    /// Body positions: [B, T_body, H]
    pub body:              Tensor<B, 3>,
    /// One [B, heads, T, T] tensor per layer when visualizing
    pub attention_weights: Vec<Tensor<B, 4>>,
}

impl<B: Backend> VitOutput<B> {
    /// The ten header outputs in position order, summary first.
    pub fn logits(&self) -> Vec<Tensor<B, 2>> {
        std::iter::once(self.summary.clone())
            .chain(self.header_logits.iter().cloned())
            .collect()
    }

    /// (ten header outputs, body features)
    pub fn into_parts(self) -> (Vec<Tensor<B, 2>>, Tensor<B, 3>) {
        let logits = self.logits();
        (logits, self.body)
    }
}

impl<B: Backend> VisionTransformer<B> {
    /// Use `VitConfig::init`, which validates the config first.
    pub(crate) fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        let heads = (0..NUM_HEADS_OUT)
            .map(|_| LinearConfig::new(cfg.hidden_size, cfg.num_classes).init(device))
            .collect();
        Self {
            transformer: Transformer::new(cfg, device),
            heads,
            zero_head:   cfg.zero_head,
        }
    }

    /// input: [B, T_body, H] per-slice features
    /// mask:  optional [B, T_body], 1 = real slice, 0 = padding
    pub fn forward(&self, input: Tensor<B, 3>, mask: Option<Tensor<B, 2>>) -> VitOutput<B> {
        let mask = mask.map(|m| extended_attention_mask(m, HEADER_TOKENS));
        let (x, attention_weights) = self.transformer.forward(input, mask);
        let [batch, seq_len, hidden] = x.dims();

        let header = |pos: usize| {
            x.clone()
                .slice([0..batch, pos..pos + 1, 0..hidden])
                .reshape([batch, hidden])
        };

        let summary = header(0);
        let header_logits = self
            .heads
            .iter()
            .enumerate()
            .map(|(i, head)| head.forward(header(i + 1)))
            .collect();
        let body = x.clone().slice([0..batch, HEADER_TOKENS..seq_len, 0..hidden]);

        VitOutput { summary, header_logits, body, attention_weights }
    }

    /// Overwrite the encoder from a pretrained table.
    ///
    /// Heads have no counterpart in the table: with `zero_head`
    /// they are zeroed, otherwise they keep their initialization.
    pub fn load_from<T: WeightTable + ?Sized>(&mut self, table: &T) -> VitResult<()> {
        if self.zero_head {
            for head in &mut self.heads {
                let [d_in, d_out] = head.weight.val().dims();
                let device = head.weight.val().device();
                head.weight = Initializer::Zeros.init([d_in, d_out], &device);
                head.bias   = Some(Param::from_tensor(Tensor::zeros([d_out], &device)));
            }
        }

        self.transformer.encoder.load_from(table)?;
        tracing::info!(
            "Imported encoder norm and {} encoder blocks",
            self.transformer.encoder.blocks.len()
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VitError;
    use crate::domain::keys::{block_key, encoder_norm_key, BlockTensor, Leaf};
    use crate::ml::testing::{assert_close, synthetic_table, tiny_config, to_vec, TestBackend};
    use burn::tensor::Distribution;

    fn features(batch: usize, body_len: usize) -> Tensor<TestBackend, 3> {
        Tensor::random([batch, body_len, 8], Distribution::Normal(0.0, 1.0), &Default::default())
    }

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device).unwrap();
        let out    = model.forward(features(3, 6), None);

        assert_eq!(out.summary.dims(), [3, 8]);
        assert_eq!(out.header_logits.len(), 9);
        assert!(out.header_logits.iter().all(|l| l.dims() == [3, 1]));
        assert_eq!(out.body.dims(), [3, 6, 8]);
        assert!(out.attention_weights.is_empty());

        let (logits, body) = out.into_parts();
        assert_eq!(logits.len(), HEADER_TOKENS);
        assert_eq!(logits[0].dims(), [3, 8]);
        assert_eq!(body.dims(), [3, 6, 8]);
    }

    #[test]
    fn test_all_ones_mask_matches_unmasked() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device).unwrap();
        let x      = features(2, 5);
        let ones   = Tensor::<TestBackend, 2>::ones([2, 5], &device);

        let dense  = model.forward(x.clone(), None);
        let masked = model.forward(x, Some(ones));
        assert_close(&to_vec(dense.body), &to_vec(masked.body), 1e-5);
        assert_close(&to_vec(dense.summary), &to_vec(masked.summary), 1e-5);
    }

    #[test]
    fn test_padding_is_not_attended() {
        let device = Default::default();
        let model  = tiny_config().with_visualize(true).init::<TestBackend>(&device).unwrap();
        // second exam has its last two slices padded
        let mask = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0], [2, 4]),
            &device,
        );
        let out = model.forward(features(2, 4), Some(mask));
        assert_eq!(out.attention_weights.len(), 2);

        let seq_len = HEADER_TOKENS + 4;
        for layer in out.attention_weights {
            let probs = to_vec(layer);
            let per_example = 2 * seq_len * seq_len;
            for row in probs[per_example..].chunks(seq_len) {
                assert!(row[seq_len - 1] < 1e-6 && row[seq_len - 2] < 1e-6);
            }
        }
    }

    #[test]
    fn test_padding_does_not_change_real_outputs() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device).unwrap();
        let x      = features(1, 3);

        // same exam padded with two junk slices, masked out
        let junk   = Tensor::<TestBackend, 3>::ones([1, 2, 8], &device).mul_scalar(7.0);
        let padded = Tensor::cat(vec![x.clone(), junk], 1);
        let mask   = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 1.0, 0.0, 0.0], [1, 5]),
            &device,
        );

        let plain  = model.forward(x, None);
        let masked = model.forward(padded, Some(mask));
        assert_close(&to_vec(plain.summary), &to_vec(masked.summary), 1e-4);
        assert_close(
            &to_vec(plain.header_logits[0].clone()),
            &to_vec(masked.header_logits[0].clone()),
            1e-4,
        );
    }

    #[test]
    fn test_load_from_round_trip() {
        let device = Default::default();
        let cfg    = tiny_config();
        let table  = synthetic_table(&cfg);
        let mut model = cfg.init::<TestBackend>(&device).unwrap();
        model.load_from(&table).unwrap();

        let encoder = &model.transformer.encoder;
        assert_close(
            &to_vec(encoder.encoder_norm.gamma.val()),
            table[&encoder_norm_key(Leaf::Scale)].data(),
            0.0,
        );
        assert_close(
            &to_vec(encoder.encoder_norm.beta.val()),
            table[&encoder_norm_key(Leaf::Bias)].data(),
            0.0,
        );
        for (i, block) in encoder.blocks.iter().enumerate() {
            let src = &table[&block_key(i, BlockTensor::Out, Leaf::Kernel)];
            assert_close(&to_vec(block.attention.out.weight.val()), src.data(), 0.0);
            let src = &table[&block_key(i, BlockTensor::Dense1, Leaf::Bias)];
            assert_close(&to_vec(block.ffn.fc2.bias.as_ref().unwrap().val()), src.data(), 0.0);
            let src = &table[&block_key(i, BlockTensor::MlpNorm, Leaf::Scale)];
            assert_close(&to_vec(block.ffn_norm.gamma.val()), src.data(), 0.0);
        }
    }

    #[test]
    fn test_zero_head_import() {
        let device = Default::default();
        let cfg    = tiny_config().with_zero_head(true);
        let mut model = cfg.init::<TestBackend>(&device).unwrap();
        model.load_from(&synthetic_table(&cfg)).unwrap();

        for head in &model.heads {
            assert!(to_vec(head.weight.val()).iter().all(|&w| w == 0.0));
            assert!(to_vec(head.bias.as_ref().unwrap().val()).iter().all(|&b| b == 0.0));
        }
        let out = model.forward(features(2, 3), None);
        assert!(to_vec(out.header_logits[4].clone()).iter().all(|&l| l == 0.0));
    }

    #[test]
    fn test_missing_encoder_norm_fails() {
        let device = Default::default();
        let cfg    = tiny_config();
        let mut table = synthetic_table(&cfg);
        table.remove(&encoder_norm_key(Leaf::Bias));
        let mut model = cfg.init::<TestBackend>(&device).unwrap();
        assert!(matches!(model.load_from(&table), Err(VitError::MissingKey(_))));
    }

    #[test]
    fn test_missing_key_in_last_block_fails() {
        let device = Default::default();
        let cfg    = tiny_config();
        let mut table = synthetic_table(&cfg);
        table.remove(&block_key(1, BlockTensor::Key, Leaf::Kernel));
        let mut model = cfg.init::<TestBackend>(&device).unwrap();
        assert!(matches!(model.load_from(&table), Err(VitError::MissingKey(k)) if k.contains("encoderblock_1")));
    }
}
