pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::checkpoint::Checkpoint;
pub use crate::adapters::flow::{AffineGaussianFlow, Dequantization};
pub use crate::adapters::loader::InMemoryLoader;
pub use crate::config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::core::dataset::Statistic;
pub use crate::core::engine::EvalEngine;
pub use crate::utils::error::{EvalError, Result};
