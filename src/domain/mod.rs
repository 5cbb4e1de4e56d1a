// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Pure Rust types shared by every other layer:
//
//   error.rs      - VitError, the typed failures of config
//                   validation and weight import
//   weights.rs    - WeightArray and the WeightTable trait the
//                   model imports pretrained tensors from
//   keys.rs       - (block, tensor role) → external key string
//   presets.rs    - registry of published ViT architectures
//   prediction.rs - per-exam inference result
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums, traits and pure functions

pub mod error;

pub mod weights;

pub mod keys;

pub mod presets;

pub mod prediction;
