// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File formats on either side of the model:
//
//   checkpoint.rs        - Burn record of an imported model plus
//                          its VitConfig as JSON
//
//   safetensors_store.rs - pretrained weight tables and per-exam
//                          slice features in safetensors files
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            https://github.com/huggingface/safetensors

pub mod checkpoint;
pub mod safetensors_store;
