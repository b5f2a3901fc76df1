use crate::domain::model::EvalOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;
use ndarray::{Array1, ArrayD};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A trained density model. Axis 0 of every input is the batch axis.
///
/// Methods take `&mut self` so stochastic models (dequantization noise)
/// can advance their random state.
pub trait DensityModel {
    /// Per-example log density, one entry per row of `x`.
    fn log_prob(&mut self, x: &ArrayD<f64>) -> Result<Array1<f64>>;

    /// Latent `z` for every example together with its log-Jacobian-determinant.
    fn z_ldj(&mut self, x: &ArrayD<f64>) -> Result<(ArrayD<f64>, Array1<f64>)>;
}

pub trait DataLoader {
    fn name(&self) -> &str;
    fn num_batches(&self) -> usize;
    fn batch(&self, index: usize) -> Result<ArrayD<f64>>;

    fn batches(&self) -> Box<dyn Iterator<Item = Result<ArrayD<f64>>> + '_> {
        Box::new((0..self.num_batches()).map(move |i| self.batch(i)))
    }
}

#[async_trait]
pub trait EvalTask: Send + Sync {
    fn label(&self) -> String;
    async fn evaluate(&mut self) -> Result<EvalOutcome>;
    async fn persist(&self, outcome: &EvalOutcome) -> Result<String>;
}
