// ============================================================
// Layer 3 - ExamPrediction Domain Type
// ============================================================
// What inference reports for one exam (one sequence of slices):
//   - num_classes logits per classified header position
//     (header positions 1..=9), plus their sigmoid probabilities
//   - the L2 norm of header position 0, the pooled body summary
//     that downstream stages consume as a raw vector
//   - how many body positions (real slices) the exam had

use serde::{Deserialize, Serialize};

/// Per-exam output of the classification model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPrediction {
    /// Name of the exam in the input file
    pub exam: String,

    /// Raw logits of heads 1..=9, in header order; each head
    /// contributes `num_classes` consecutive values
    pub header_logits: Vec<f32>,

    /// Outputs per head
    pub num_classes: usize,

    /// L2 norm of the summary vector at header position 0
    pub summary_norm: f32,

    /// Number of real (unpadded) slices
    pub num_slices: usize,
}

impl ExamPrediction {
    pub fn new(
        exam:          impl Into<String>,
        header_logits: Vec<f32>,
        num_classes:   usize,
        summary_norm:  f32,
        num_slices:    usize,
    ) -> Self {
        Self { exam: exam.into(), header_logits, num_classes, summary_norm, num_slices }
    }

    /// Sigmoid of each head logit; every head is an independent label.
    pub fn probabilities(&self) -> Vec<f32> {
        self.header_logits.iter().map(|&z| 1.0 / (1.0 + (-z).exp())).collect()
    }

    /// Header positions (1..=9) with at least one class whose
    /// probability reaches `threshold`, each listed once.
    pub fn positive_headers(&self, threshold: f32) -> Vec<usize> {
        let per_head = self.num_classes.max(1);
        let mut headers: Vec<usize> = self
            .probabilities()
            .into_iter()
            .enumerate()
            .filter(|&(_, p)| p >= threshold)
            .map(|(i, _)| i / per_head + 1)
            .collect();
        headers.dedup();
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilities() {
        let p = ExamPrediction::new("exam_0", vec![0.0, 100.0, -100.0], 1, 1.0, 4);
        let probs = p.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs[1] > 0.999);
        assert!(probs[2] < 0.001);
    }

    #[test]
    fn test_positive_headers_are_one_based() {
        let p = ExamPrediction::new("exam_0", vec![-5.0, 5.0, 0.0], 1, 1.0, 4);
        assert_eq!(p.positive_headers(0.5), vec![2, 3]);
    }

    #[test]
    fn test_positive_headers_group_classes_by_head() {
        // three heads of two classes: head 1 fires twice, head 2 never
        let logits = vec![5.0, 5.0, -5.0, -5.0, -5.0, 5.0];
        let p = ExamPrediction::new("exam_0", logits, 2, 1.0, 4);
        assert_eq!(p.positive_headers(0.5), vec![1, 3]);
    }
}
