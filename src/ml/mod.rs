// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Every Burn module of the classifier lives here. The other
// layers hand in plain values (WeightTable, ExamSample) and
// get tensors or plain predictions back.
//
//   config.rs      - VitConfig + header-token constants
//   attention.rs   - multi-head self-attention with additive mask
//   mlp.rs         - Linear → GELU → Linear feed-forward
//   block.rs       - pre-norm encoder block
//   encoder.rs     - block stack + final encoder_norm
//   embeddings.rs  - learned header tokens prepended to the body
//   transformer.rs - embeddings + encoder
//   mask.rs        - 0/1 slice mask → additive attention bias
//   model.rs       - VisionTransformer: split headers, run heads
//   import.rs      - pretrained table → parameter tensors
//   inferencer.rs  - checkpoint → predictions over exam batches
//
// Reference: Dosovitskiy et al. (2021) An Image is Worth 16x16 Words
//            Burn Book §3 (Building Blocks)

pub mod config;
pub mod attention;
pub mod mlp;
pub mod block;
pub mod encoder;
pub mod embeddings;
pub mod transformer;
pub mod mask;
pub mod model;
pub mod import;
pub mod inferencer;

#[cfg(test)]
pub mod testing;
