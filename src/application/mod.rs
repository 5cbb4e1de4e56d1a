// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math (Layer 5), no
// printing (Layer 1), no file formats (Layer 6).
//
//   import_use_case.rs    - pretrained safetensors → checkpoint
//   infer_use_case.rs     - checkpoint + exam features → predictions
//   summarize_use_case.rs - config → parameter layout

pub mod import_use_case;
pub mod infer_use_case;
pub mod summarize_use_case;
