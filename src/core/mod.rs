pub mod dataset;
pub mod engine;
pub mod latent;
pub mod loss;
pub mod tasks;

pub use crate::domain::model::{EvalOutcome, ExportSummary, LatentRecord, Split};
pub use crate::domain::ports::{DataLoader, DensityModel, EvalTask, Storage};
pub use crate::utils::error::Result;
