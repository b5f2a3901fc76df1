//! Wiring from parsed command line flags to an evaluation run.

use crate::config::args_bundle::ArgsBundle;
use crate::config::cli::LocalStorage;
use crate::config::setup::EvalSetup;
use crate::config::{loglik_statistic, CliConfig, EvalCommand};
use crate::core::engine::EvalEngine;
use crate::core::tasks::{LatentExportTask, LoglikTask};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Output directory of `save-latent`: `--output` or the bundle default.
pub fn latent_output_dir(output: Option<&str>, args: &ArgsBundle) -> PathBuf {
    output
        .map(PathBuf::from)
        .unwrap_or_else(|| args.default_output_dir())
}

/// Runs the command described by `config`. Returns the path results were written to.
pub async fn run(config: &CliConfig) -> Result<String> {
    let model_dir = Path::new(&config.model);
    let setup = EvalSetup::load(model_dir, Some(config.batch_size), config.seed)?;

    match &config.command {
        EvalCommand::Loglik { k, kbs, nats, mc } => {
            let statistic = loglik_statistic(*k, *kbs, *nats, *mc)?;
            tracing::info!("Starting {} ({})", statistic.label(), statistic.unit());

            let storage = LocalStorage::new(config.model.clone());
            let task = LoglikTask::new(
                setup.model,
                setup.eval,
                storage,
                config.model.clone(),
                statistic,
                setup.epoch,
                config.verbose,
            );
            let mut engine = EvalEngine::new_with_monitoring(task, config.monitor);
            engine.run().await
        }
        EvalCommand::SaveLatent { output } => {
            let output_dir = latent_output_dir(output.as_deref(), &setup.args);
            tracing::info!("Starting Saving Latent to {}", output_dir.display());

            let storage = LocalStorage::new(output_dir.clone());
            let task = LatentExportTask::new(
                setup.model,
                setup.train,
                setup.eval,
                storage,
                output_dir,
                setup.epoch,
                config.verbose,
            );
            let mut engine = EvalEngine::new_with_monitoring(task, config.monitor);
            engine.run().await
        }
    }
}
