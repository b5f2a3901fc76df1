pub mod args_bundle;
pub mod cli;
#[cfg(feature = "cli")]
pub mod command;
pub mod setup;

#[cfg(feature = "cli")]
pub use command::{loglik_statistic, CliConfig, EvalCommand};
