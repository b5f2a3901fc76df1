use crate::adapters::checkpoint::Checkpoint;
use crate::adapters::flow::AffineGaussianFlow;
use crate::adapters::loader::{load_csv_split, InMemoryLoader};
use crate::config::args_bundle::ArgsBundle;
use crate::domain::model::Split;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};

pub fn args_path(model_dir: &Path) -> PathBuf {
    model_dir.join("args.toml")
}

pub fn checkpoint_path(model_dir: &Path) -> PathBuf {
    model_dir.join("check").join("checkpoint.json")
}

/// Everything a run needs, restored from a model directory.
#[derive(Debug)]
pub struct EvalSetup {
    pub args: ArgsBundle,
    pub epoch: u64,
    pub model: AffineGaussianFlow,
    pub train: InMemoryLoader,
    pub eval: InMemoryLoader,
}

impl EvalSetup {
    /// Reads `args.toml` and the checkpoint, builds the model and both loaders.
    /// `batch_size` overrides the one saved with the training arguments.
    pub fn load(model_dir: &Path, batch_size: Option<usize>, seed: u64) -> Result<Self> {
        let mut args = ArgsBundle::from_file(args_path(model_dir))?;
        if let Some(batch_size) = batch_size {
            args.batch_size = batch_size;
        }
        args.validate()?;
        tracing::debug!("Args bundle: {:?}", args);

        let checkpoint = Checkpoint::from_file(checkpoint_path(model_dir))?;
        let model = checkpoint.build_flow(args.dims(), args.model.dequantization(), seed)?;
        tracing::info!(
            "Loaded weights for model at {}/{} epochs",
            checkpoint.current_epoch,
            args.epochs
                .map(|e| e.to_string())
                .unwrap_or_else(|| "?".to_string())
        );

        let train = Self::loader(&args, Split::Train)?;
        let eval = Self::loader(&args, Split::Eval)?;

        Ok(Self {
            epoch: checkpoint.current_epoch,
            args,
            model,
            train,
            eval,
        })
    }

    fn loader(args: &ArgsBundle, split: Split) -> Result<InMemoryLoader> {
        let data = load_csv_split(args.split_path(split.as_str()), &args.data_shape)?;
        InMemoryLoader::new(split.as_str(), data, args.batch_size)
    }
}
