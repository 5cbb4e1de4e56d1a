// ============================================================
// Layer 3 - Preset Registry
// ============================================================
// The named architectures pretrained checkpoints are published
// under. A preset is plain data: the model layer turns it into
// a VitConfig (see ml::config) and may override any field.
//
// Patch and ResNet settings are reported when a preset is
// selected; the active model consumes pre-embedded slice
// features and never builds a patch projection or hybrid
// backbone.

use crate::domain::error::{VitError, VitResult};

/// Patch tokenization of the pretrained network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patches {
    /// Square patches of this side length
    Size(usize),
    /// Hybrid models: a (rows, cols) grid over backbone features
    Grid(usize, usize),
}

/// Backbone settings for the hybrid ResNet + ViT preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResNetSpec {
    pub num_layers:   Vec<usize>,
    pub width_factor: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name:                   &'static str,
    pub patches:                Patches,
    pub hidden_size:            usize,
    pub mlp_dim:                usize,
    pub num_heads:              usize,
    pub num_layers:             usize,
    pub attention_dropout_rate: f64,
    pub dropout_rate:           f64,
    pub resnet:                 Option<ResNetSpec>,
}

pub const PRESET_NAMES: [&str; 8] = [
    "ViT-B_16",
    "ViT-B_16_NI",
    "ViT-B_32",
    "ViT-L_16",
    "ViT-L_32",
    "ViT-H_14",
    "R50-ViT-B_16",
    "testing",
];

fn base_b16(name: &'static str) -> Preset {
    Preset {
        name,
        patches:                Patches::Size(16),
        hidden_size:            768,
        mlp_dim:                3072,
        num_heads:              12,
        num_layers:             12,
        attention_dropout_rate: 0.0,
        dropout_rate:           0.1,
        resnet:                 None,
    }
}

fn base_l16(name: &'static str) -> Preset {
    Preset {
        hidden_size: 1024,
        mlp_dim:     4096,
        num_heads:   16,
        num_layers:  24,
        ..base_b16(name)
    }
}

/// Look up a preset by its published name.
pub fn preset(name: &str) -> VitResult<Preset> {
    let p = match name {
        "ViT-B_16" => base_b16("ViT-B_16"),
        // Same architecture as B/16; the checkpoint differs, not the shape
        "ViT-B_16_NI" => base_b16("ViT-B_16_NI"),
        "ViT-B_32" => Preset { patches: Patches::Size(32), ..base_b16("ViT-B_32") },
        "ViT-L_16" => base_l16("ViT-L_16"),
        "ViT-L_32" => Preset { patches: Patches::Size(32), ..base_l16("ViT-L_32") },
        "ViT-H_14" => Preset {
            patches:     Patches::Size(14),
            hidden_size: 1280,
            mlp_dim:     5120,
            num_heads:   16,
            num_layers:  32,
            ..base_b16("ViT-H_14")
        },
        "R50-ViT-B_16" => Preset {
            patches: Patches::Grid(14, 14),
            resnet:  Some(ResNetSpec { num_layers: vec![3, 4, 9], width_factor: 1 }),
            ..base_b16("R50-ViT-B_16")
        },
        "testing" => Preset {
            hidden_size: 1,
            mlp_dim:     1,
            num_heads:   1,
            num_layers:  1,
            ..base_b16("testing")
        },
        other => return Err(VitError::UnknownPreset(other.to_string())),
    };
    Ok(p)
}
