// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Per-slice features arrive already extracted. This layer only
// groups them per exam and pads exams into tensor batches:
//
//   safetensors file (infra::safetensors_store)
//       │
//       ▼
//   ExamSample / ExamDataset → one exam = ordered slice vectors
//       │
//       ▼
//   SliceBatcher             → padded features + 0/1 slice mask
//       │
//       ▼
//   VisionTransformer::forward

pub mod dataset;
pub mod batcher;
