// ============================================================
// Layer 5 - Model Configuration
// ============================================================
// Resolved hyperparameters of one VisionTransformer instance.
//
// Defaults are the slice-classifier's own sizes (a 6144-wide
// feature per slice, 2 layers of 2 heads). A preset from the
// registry can seed the values, then individual fields are
// overridden with the generated `with_*` setters. The config
// is an immutable value: building a model reads it and never
// writes back into it.

use burn::{
    nn::{LayerNorm, LayerNormConfig},
    prelude::*,
};

use crate::domain::error::{VitError, VitResult};
use crate::domain::presets::Preset;
use crate::ml::model::VisionTransformer;

/// Number of header positions prepended to every sequence:
/// position 0 carries the body summary, 1..=9 are classified.
pub const HEADER_TOKENS: usize = 10;

/// Number of header positions that go through a linear head.
pub const NUM_HEADS_OUT: usize = HEADER_TOKENS - 1;

/// Epsilon of every LayerNorm in the encoder.
pub const NORM_EPS: f64 = 1e-6;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct VitConfig {
    /// Width of every token vector
    #[config(default = 6144)]
    pub hidden_size: usize,

    /// Inner width of the feed-forward block
    #[config(default = 1024)]
    pub mlp_dim: usize,

    /// Attention heads; must divide hidden_size
    #[config(default = 2)]
    pub num_heads: usize,

    /// Encoder blocks in the stack
    #[config(default = 2)]
    pub num_layers: usize,

    /// Dropout on attention probabilities and on the attention output
    #[config(default = 0.0)]
    pub attention_dropout_rate: f64,

    /// Dropout inside the feed-forward block and on embeddings
    #[config(default = 0.1)]
    pub dropout_rate: f64,

    /// Outputs per classification head
    #[config(default = 1)]
    pub num_classes: usize,

    /// Zero the classification heads when importing pretrained weights
    #[config(default = false)]
    pub zero_head: bool,

    /// Return per-layer attention probabilities from forward
    #[config(default = false)]
    pub visualize: bool,

    /// Apply dropout to the embedded sequence before the encoder
    #[config(default = false)]
    pub embedding_dropout: bool,
}

impl VitConfig {
    /// Seed a config from a registry preset.
    pub fn from_preset(preset: &Preset) -> Self {
        Self::new()
            .with_hidden_size(preset.hidden_size)
            .with_mlp_dim(preset.mlp_dim)
            .with_num_heads(preset.num_heads)
            .with_num_layers(preset.num_layers)
            .with_attention_dropout_rate(preset.attention_dropout_rate)
            .with_dropout_rate(preset.dropout_rate)
    }

    /// Width of one attention head.
    pub fn head_size(&self) -> usize {
        self.hidden_size / self.num_heads
    }

    /// Reject configurations that cannot build a model.
    pub fn validate(&self) -> VitResult<()> {
        let sizes = [
            ("hidden_size", self.hidden_size),
            ("mlp_dim", self.mlp_dim),
            ("num_heads", self.num_heads),
            ("num_layers", self.num_layers),
            ("num_classes", self.num_classes),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(VitError::InvalidConfig(format!("{name} must be positive")));
        }
        if self.hidden_size % self.num_heads != 0 {
            return Err(VitError::HeadsDoNotDivide {
                hidden_size: self.hidden_size,
                num_heads:   self.num_heads,
            });
        }
        for (name, rate) in [
            ("attention_dropout_rate", self.attention_dropout_rate),
            ("dropout_rate", self.dropout_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(VitError::InvalidConfig(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// LayerNorm over hidden_size with the encoder's epsilon.
    pub fn init_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size).with_epsilon(NORM_EPS).init(device)
    }

    /// Validate, then allocate a freshly initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> VitResult<VisionTransformer<B>> {
        self.validate()?;
        Ok(VisionTransformer::new(self, device))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::presets::preset;

    #[test]
    fn test_defaults() {
        let cfg = VitConfig::new();
        assert_eq!(cfg.hidden_size, 6144);
        assert_eq!(cfg.head_size(), 3072);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_preset() {
        let cfg = VitConfig::from_preset(&preset("ViT-L_16").unwrap());
        assert_eq!((cfg.hidden_size, cfg.num_heads, cfg.num_layers), (1024, 16, 24));
        assert_eq!(cfg.head_size() * cfg.num_heads, cfg.hidden_size);
    }

    #[test]
    fn test_rejects_non_dividing_heads() {
        let cfg = VitConfig::new().with_hidden_size(10).with_num_heads(3);
        assert!(matches!(
            cfg.validate(),
            Err(VitError::HeadsDoNotDivide { hidden_size: 10, num_heads: 3 })
        ));
    }

    #[test]
    fn test_rejects_zero_sizes_and_bad_dropout() {
        assert!(VitConfig::new().with_num_heads(0).validate().is_err());
        assert!(VitConfig::new().with_num_layers(0).validate().is_err());
        assert!(VitConfig::new().with_dropout_rate(1.0).validate().is_err());
        assert!(VitConfig::new().with_attention_dropout_rate(-0.1).validate().is_err());
    }

    #[test]
    fn test_init_fails_fast() {
        let device = Default::default();
        let cfg = VitConfig::new().with_hidden_size(8).with_num_heads(3);
        let model = cfg.init::<burn::backend::NdArray>(&device);
        assert!(matches!(model, Err(VitError::HeadsDoNotDivide { .. })));
    }

    #[test]
    fn test_init_norm_standardizes_rows() {
        type B = burn::backend::NdArray;
        let device = Default::default();
        let norm: LayerNorm<B> = VitConfig::new().with_hidden_size(4).init_norm(&device);
        let x = Tensor::<B, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0, -2.0, 0.0, 2.0, 4.0], [2, 4]),
            &device,
        );
        let y: Vec<f32> = norm.forward(x).into_data().to_vec().unwrap();
        for row in y.chunks(4) {
            let mean = row.iter().sum::<f32>() / 4.0;
            let var  = row.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 4.0;
            assert!(mean.abs() < 1e-5);
            assert!((var - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg = VitConfig::new().with_hidden_size(64).with_visualize(true);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: VitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hidden_size, 64);
        assert!(back.visualize);
    }
}
