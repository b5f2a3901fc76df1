use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dataset split a batch or an export belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Eval,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Eval => "eval",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One latent tensor as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentRecord {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl LatentRecord {
    pub fn from_array(array: &ArrayD<f64>) -> Self {
        Self {
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        }
    }

    pub fn into_array(self) -> crate::utils::error::Result<ArrayD<f64>> {
        Ok(ArrayD::from_shape_vec(self.shape, self.data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub split: Split,
    pub batches: usize,
    pub examples: usize,
    /// Absent when the split had no examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_ldj: Option<f64>,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} latents in {} batches",
            self.examples, self.split, self.batches
        )?;
        match self.mean_ldj {
            Some(mean) => write!(f, ", mean ldj {:.4}", mean),
            None => Ok(()),
        }
    }
}

/// Result of one evaluation run, handed from `evaluate` to `persist`.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Scalar { label: String, value: f64 },
    Latents(Vec<ExportSummary>),
}
