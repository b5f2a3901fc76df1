use crate::adapters::flow::{AffineGaussianFlow, Dequantization};
use crate::utils::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Learned parameters of an [`AffineGaussianFlow`], flattened over the data shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub loc: Vec<f64>,
    pub log_scale: Vec<f64>,
}

/// `check/checkpoint.json` inside a model directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub current_epoch: u64,
    pub model: FlowState,
}

impl Checkpoint {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EvalError::IoError)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Builds the flow, checking the parameters against the data dimensionality.
    pub fn build_flow(
        &self,
        dims: usize,
        dequantization: Dequantization,
        seed: u64,
    ) -> Result<AffineGaussianFlow> {
        if self.model.loc.len() != dims {
            return Err(EvalError::ShapeMismatch {
                context: "checkpoint".to_string(),
                expected: format!("{} parameters per vector (data_shape)", dims),
                actual: self.model.loc.len().to_string(),
            });
        }
        AffineGaussianFlow::new(
            self.model.loc.clone(),
            self.model.log_scale.clone(),
            dequantization,
            seed,
        )
    }
}
