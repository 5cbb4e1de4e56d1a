// ============================================================
// Layer 5 - Position-wise Feed-Forward
// ============================================================
// MLP(x) = dropout(fc2(dropout(gelu(fc1(x)))))
// applied to each token independently:
//   [B, T, H] → [B, T, mlp_dim] → [B, T, H]
//
// Init: Xavier-uniform weights, N(0, 1e-6) biases.

use burn::{
    nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::gelu,
};

use crate::ml::config::VitConfig;

const BIAS_STD: f64 = 1e-6;

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,
    dropout: Dropout,
}

fn init_linear<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    let mut linear = LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    linear.bias = Some(Initializer::Normal { mean: 0.0, std: BIAS_STD }.init([d_out], device));
    linear
}

impl<B: Backend> Mlp<B> {
    pub fn new(cfg: &VitConfig, device: &B::Device) -> Self {
        Self {
            fc1:     init_linear(cfg.hidden_size, cfg.mlp_dim, device),
            fc2:     init_linear(cfg.mlp_dim, cfg.hidden_size, device),
            dropout: DropoutConfig::new(cfg.dropout_rate).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.dropout.forward(gelu(self.fc1.forward(x)));
        self.dropout.forward(self.fc2.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{to_vec, tiny_config, TestBackend};

    #[test]
    fn test_preserves_shape() {
        let device = Default::default();
        let mlp    = Mlp::<TestBackend>::new(&tiny_config(), &device);
        let x      = Tensor::<TestBackend, 3>::ones([2, 7, 8], &device);
        assert_eq!(mlp.forward(x).dims(), [2, 7, 8]);
        assert_eq!(mlp.fc1.weight.val().dims(), [8, 16]);
    }

    #[test]
    fn test_biases_start_near_zero() {
        let device = Default::default();
        let mlp    = Mlp::<TestBackend>::new(&tiny_config(), &device);
        for linear in [&mlp.fc1, &mlp.fc2] {
            let bias = to_vec(linear.bias.as_ref().unwrap().val());
            assert!(bias.iter().all(|b| b.abs() < 1e-4));
        }
    }

    #[test]
    fn test_xavier_bound() {
        let device = Default::default();
        let mlp    = Mlp::<TestBackend>::new(&tiny_config(), &device);
        // U(-a, a) with a = sqrt(6 / (fan_in + fan_out))
        let bound = (6.0f32 / (8.0 + 16.0)).sqrt();
        assert!(to_vec(mlp.fc1.weight.val()).iter().all(|w| w.abs() <= bound));
    }
}
