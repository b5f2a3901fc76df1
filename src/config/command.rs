use crate::core::dataset::Statistic;
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "flow-eval")]
#[command(about = "Likelihood bounds and latent export for a trained normalizing flow")]
pub struct CliConfig {
    /// Model directory containing args.toml and check/checkpoint.json
    #[arg(long)]
    pub model: String,

    /// Overrides the batch size stored in args.toml
    #[arg(long, default_value = "64")]
    pub batch_size: usize,

    #[arg(long, default_value = "0")]
    pub seed: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory at each phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: EvalCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EvalCommand {
    /// Evaluate a likelihood bound on the eval split
    Loglik {
        /// Importance samples; without it the ELBO is computed
        #[arg(long)]
        k: Option<usize>,

        /// Importance samples per forward pass; must divide k
        #[arg(long)]
        kbs: Option<usize>,

        /// Report nats instead of bits per dimension
        #[arg(long)]
        nats: bool,

        /// Average the bpd over k passes instead of importance weighting
        #[arg(long)]
        mc: bool,
    },
    /// Write per-example latents and ldj terms for both splits
    SaveLatent {
        /// Defaults to <data_root>/<dataset>_new
        #[arg(long)]
        output: Option<String>,
    },
}

/// Statistic selected by the `loglik` flags.
pub fn loglik_statistic(
    k: Option<usize>,
    kbs: Option<usize>,
    nats: bool,
    mc: bool,
) -> Result<Statistic> {
    let statistic = match (k, mc, nats) {
        (None, true, _) => {
            return Err(EvalError::ConfigValidationError {
                field: "mc".to_string(),
                message: "--mc needs --k".to_string(),
            })
        }
        (None, false, _) if kbs.is_some() => {
            return Err(EvalError::ConfigValidationError {
                field: "kbs".to_string(),
                message: "--kbs needs --k".to_string(),
            })
        }
        (Some(_), true, true) => {
            return Err(EvalError::ConfigValidationError {
                field: "mc".to_string(),
                message: "--mc reports bits per dimension only".to_string(),
            })
        }
        (None, false, false) => Statistic::ElboBpd,
        (None, false, true) => Statistic::ElboNats,
        (Some(k), true, false) => Statistic::McBpd { k, kbs },
        (Some(k), false, false) => Statistic::IwboBpd { k, kbs },
        (Some(k), false, true) => Statistic::IwboNats { k, kbs },
    };
    Ok(statistic)
}

impl CliConfig {
    /// The statistic a `loglik` run computes, `None` for other commands.
    pub fn statistic(&self) -> Result<Option<Statistic>> {
        match self.command {
            EvalCommand::Loglik { k, kbs, nats, mc } => {
                loglik_statistic(k, kbs, nats, mc).map(Some)
            }
            EvalCommand::SaveLatent { .. } => Ok(None),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("model", &self.model)?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        if let EvalCommand::SaveLatent {
            output: Some(output),
        } = &self.command
        {
            validation::validate_path("output", output)?;
        }
        if let Some(statistic) = self.statistic()? {
            statistic.validate()?;
        }
        Ok(())
    }
}
