use crate::core::DataLoader;
use crate::utils::error::{EvalError, Result};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use std::path::Path;

/// Batches over a dataset held in memory, in order, with a possibly short last batch.
#[derive(Debug, Clone)]
pub struct InMemoryLoader {
    name: String,
    data: ArrayD<f64>,
    batch_size: usize,
}

impl InMemoryLoader {
    pub fn new(name: impl Into<String>, data: ArrayD<f64>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(EvalError::InvalidConfigValueError {
                field: "batch_size".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }
        if data.ndim() == 0 {
            return Err(EvalError::InvalidData {
                message: "dataset needs a leading example axis".to_string(),
            });
        }
        Ok(Self {
            name: name.into(),
            data,
            batch_size,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl DataLoader for InMemoryLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size)
    }

    fn batch(&self, index: usize) -> Result<ArrayD<f64>> {
        let start = index * self.batch_size;
        if start >= self.len() {
            return Err(EvalError::InvalidData {
                message: format!(
                    "batch {} out of range for '{}' ({} batches)",
                    index,
                    self.name,
                    self.num_batches()
                ),
            });
        }
        let end = (start + self.batch_size).min(self.len());
        Ok(self
            .data
            .slice_axis(Axis(0), Slice::from(start..end))
            .to_owned())
    }
}

/// Reads a headerless CSV file with one flattened example per row and
/// reshapes it to `[rows, data_shape...]`.
pub fn load_csv_split<P: AsRef<Path>>(path: P, data_shape: &[usize]) -> Result<ArrayD<f64>> {
    let path = path.as_ref();
    let dims: usize = data_shape.iter().product();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut rows = 0usize;
    for (line, row) in reader.deserialize::<Vec<f64>>().enumerate() {
        let row = row?;
        if row.len() != dims {
            return Err(EvalError::InvalidData {
                message: format!(
                    "{}:{} has {} values, expected {} for shape {:?}",
                    path.display(),
                    line + 1,
                    row.len(),
                    dims,
                    data_shape
                ),
            });
        }
        values.extend(row);
        rows += 1;
    }

    let mut shape = Vec::with_capacity(data_shape.len() + 1);
    shape.push(rows);
    shape.extend_from_slice(data_shape);
    tracing::debug!("Loaded {} examples from {}", rows, path.display());

    Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_batches_cover_dataset_in_order() {
        let data = ArrayD::from_shape_vec(IxDyn(&[5, 2]), (0..10).map(f64::from).collect())
            .unwrap();
        let loader = InMemoryLoader::new("train", data, 2).unwrap();

        assert_eq!(loader.len(), 5);
        assert_eq!(loader.num_batches(), 3);
        let sizes: Vec<usize> = loader.batches().map(|b| b.unwrap().shape()[0]).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(loader.batch(2).unwrap()[[0, 1]], 9.0);
        assert!(loader.batch(3).is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let data = ArrayD::zeros(IxDyn(&[4, 2]));
        assert!(InMemoryLoader::new("train", data, 0).is_err());
    }

    #[test]
    fn test_load_csv_split_reshapes_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0, 1, 2, 3").unwrap();
        writeln!(file, "4, 5, 6, 7").unwrap();
        writeln!(file, "8, 9, 10, 11").unwrap();

        let data = load_csv_split(file.path(), &[1, 2, 2]).unwrap();
        assert_eq!(data.shape(), &[3, 1, 2, 2]);
        assert_eq!(data[[1, 0, 1, 0]], 6.0);
    }

    #[test]
    fn test_load_csv_split_rejects_wrong_row_length() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0,1,2,3").unwrap();
        writeln!(file, "4,5,6").unwrap();

        let err = load_csv_split(file.path(), &[4]).unwrap_err();
        // csv itself flags unequal record lengths before our own row check
        assert!(matches!(
            err,
            EvalError::CsvError(_) | EvalError::InvalidData { .. }
        ));
    }
}
