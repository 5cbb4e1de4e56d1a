// ============================================================
// Layer 6 - SafeTensors Store
// ============================================================
// Reads and writes flat tensor tables in the safetensors format.
//
//   load_weight_table  - pretrained checkpoint → WeightArray table
//   load_exam_samples  - one (num_slices, hidden) tensor per exam
//   save_weight_table  - table → file (F32, little endian)
//
// F32 and F64 tensors are accepted on read (F64 narrowed to f32);
// any other dtype is an error.

use anyhow::{anyhow, bail, Context, Result};
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use safetensors::serialize_to_file;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::data::dataset::ExamSample;
use crate::domain::weights::WeightArray;

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Cannot read '{}'", path.display()))
}

fn to_f32(name: &str, view: &TensorView<'_>) -> Result<Vec<f32>> {
    let bytes = view.data();
    match view.dtype() {
        Dtype::F32 => Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()),
        Dtype::F64 => Ok(bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect()),
        other => bail!("Tensor '{name}' has unsupported dtype {other:?}"),
    }
}

fn parse(path: &Path, buffer: &[u8]) -> Result<Vec<(String, Vec<usize>, Vec<f32>)>> {
    let tensors = SafeTensors::deserialize(buffer)
        .map_err(|e| anyhow!("Cannot parse '{}' as safetensors: {e}", path.display()))?;

    tensors
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let data = to_f32(&name, &view)?;
            Ok((name, view.shape().to_vec(), data))
        })
        .collect()
}

pub fn load_weight_table(path: impl AsRef<Path>) -> Result<HashMap<String, WeightArray>> {
    let path   = path.as_ref();
    let buffer = read_file(path)?;

    let mut table = HashMap::new();
    for (name, shape, data) in parse(path, &buffer)? {
        let array = WeightArray::new(shape, data).with_context(|| format!("Tensor '{name}'"))?;
        table.insert(name, array);
    }

    tracing::info!("Loaded {} tensors from '{}'", table.len(), path.display());
    Ok(table)
}

/// Exams are returned ordered by tensor name.
pub fn load_exam_samples(path: impl AsRef<Path>) -> Result<Vec<ExamSample>> {
    let path   = path.as_ref();
    let buffer = read_file(path)?;

    let mut tensors = parse(path, &buffer)?;
    tensors.sort_by(|a, b| a.0.cmp(&b.0));

    let samples = tensors
        .into_iter()
        .map(|(name, shape, data)| match shape.as_slice() {
            [_, hidden] => ExamSample::new(name, data, *hidden),
            other => bail!("Exam '{name}' must be (num_slices, hidden_size), got {other:?}"),
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Loaded {} exams from '{}'", samples.len(), path.display());
    Ok(samples)
}

pub fn save_weight_table(path: impl AsRef<Path>, table: &HashMap<String, WeightArray>) -> Result<()> {
    let path = path.as_ref();

    let bytes: HashMap<&str, Vec<u8>> = table
        .iter()
        .map(|(name, array)| {
            let data = array.data().iter().flat_map(|x| x.to_le_bytes()).collect();
            (name.as_str(), data)
        })
        .collect();

    let mut views = Vec::with_capacity(table.len());
    for (name, array) in table {
        let data = &bytes[name.as_str()];
        let view = TensorView::new(Dtype::F32, array.shape().to_vec(), data)
            .map_err(|e| anyhow!("Tensor '{name}': {e}"))?;
        views.push((name.as_str(), view));
    }

    serialize_to_file(views, &None, path)
        .map_err(|e| anyhow!("Cannot write '{}': {e}", path.display()))?;

    tracing::debug!("Wrote {} tensors to '{}'", table.len(), path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn array(shape: Vec<usize>, start: f32) -> WeightArray {
        let n = shape.iter().product();
        WeightArray::new(shape, (0..n).map(|i| start + i as f32).collect()).unwrap()
    }

    #[test]
    fn test_weight_table_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.safetensors");

        let mut table = HashMap::new();
        table.insert("Transformer/encoder_norm/scale".to_string(), array(vec![4], 1.0));
        table.insert("Transformer/encoderblock_0/MlpBlock_3/Dense_0/kernel".to_string(), array(vec![4, 2], 0.5));
        save_weight_table(&path, &table).unwrap();

        let back = load_weight_table(&path).unwrap();
        assert_eq!(back.len(), 2);
        let kernel = &back["Transformer/encoderblock_0/MlpBlock_3/Dense_0/kernel"];
        assert_eq!(kernel.shape(), &[4, 2]);
        assert_eq!(kernel.data()[7], 7.5);
    }

    #[test]
    fn test_exam_samples_sorted_by_name() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("exams.safetensors");

        let mut table = HashMap::new();
        table.insert("exam_b".to_string(), array(vec![3, 2], 0.0));
        table.insert("exam_a".to_string(), array(vec![1, 2], 10.0));
        save_weight_table(&path, &table).unwrap();

        let exams = load_exam_samples(&path).unwrap();
        let names: Vec<&str> = exams.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["exam_a", "exam_b"]);
        assert_eq!(exams[0].num_slices, 1);
        assert_eq!(exams[1].num_slices, 3);
        assert_eq!(exams[1].hidden_size, 2);
    }

    #[test]
    fn test_exam_must_be_two_dimensional() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");

        let mut table = HashMap::new();
        table.insert("exam".to_string(), array(vec![2, 2, 2], 0.0));
        save_weight_table(&path, &table).unwrap();
        assert!(load_exam_samples(&path).is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_weight_table(dir.path().join("missing.safetensors")).is_err());
        let junk = dir.path().join("junk.safetensors");
        fs::write(&junk, b"not a safetensors file").unwrap();
        assert!(load_weight_table(&junk).is_err());
    }
}
