use crate::core::dataset::{dataset_statistic, Statistic};
use crate::core::latent::dataset_save_latent;
use crate::core::{DataLoader, DensityModel, EvalOutcome, EvalTask, ExportSummary, Split, Storage};
use crate::utils::error::{EvalError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result file for a scalar statistic, relative to the model directory.
pub fn loglik_file_name(label: &str, epoch: u64) -> String {
    format!("loglik/{}_ep{}.txt", label, epoch)
}

/// Evaluates one [`Statistic`] over a loader and records it under the model directory.
pub struct LoglikTask<M, L, S> {
    model: M,
    loader: L,
    storage: S,
    model_dir: String,
    statistic: Statistic,
    epoch: u64,
    verbose: bool,
}

impl<M, L, S> LoglikTask<M, L, S>
where
    M: DensityModel + Send + Sync,
    L: DataLoader + Send + Sync,
    S: Storage,
{
    pub fn new(
        model: M,
        loader: L,
        storage: S,
        model_dir: impl Into<String>,
        statistic: Statistic,
        epoch: u64,
        verbose: bool,
    ) -> Self {
        Self {
            model,
            loader,
            storage,
            model_dir: model_dir.into(),
            statistic,
            epoch,
            verbose,
        }
    }
}

#[async_trait]
impl<M, L, S> EvalTask for LoglikTask<M, L, S>
where
    M: DensityModel + Send + Sync,
    L: DataLoader + Send + Sync,
    S: Storage,
{
    fn label(&self) -> String {
        format!("{} on '{}'", self.statistic.label(), self.loader.name())
    }

    async fn evaluate(&mut self) -> Result<EvalOutcome> {
        let value = dataset_statistic(&mut self.model, &self.loader, self.statistic, self.verbose)?;
        Ok(EvalOutcome::Scalar {
            label: self.statistic.label(),
            value,
        })
    }

    async fn persist(&self, outcome: &EvalOutcome) -> Result<String> {
        let EvalOutcome::Scalar { label, value } = outcome else {
            return Err(EvalError::ConfigError {
                message: "loglik task can only persist a scalar result".to_string(),
            });
        };

        let name = loglik_file_name(label, self.epoch);
        self.storage.write_file(&name, value.to_string().as_bytes()).await?;
        Ok(Path::new(&self.model_dir).join(name).display().to_string())
    }
}

#[derive(Debug, Serialize)]
struct LatentExportReport<'a> {
    epoch: u64,
    completed_at: String,
    splits: &'a [ExportSummary],
}

/// Writes latents of the train and eval splits into a fresh output directory.
pub struct LatentExportTask<M, L, S> {
    model: M,
    train: L,
    eval: L,
    storage: S,
    output_dir: PathBuf,
    epoch: u64,
    verbose: bool,
}

impl<M, L, S> LatentExportTask<M, L, S>
where
    M: DensityModel + Send + Sync,
    L: DataLoader + Send + Sync,
    S: Storage,
{
    /// `storage` must be rooted at `output_dir`.
    pub fn new(
        model: M,
        train: L,
        eval: L,
        storage: S,
        output_dir: impl Into<PathBuf>,
        epoch: u64,
        verbose: bool,
    ) -> Self {
        Self {
            model,
            train,
            eval,
            storage,
            output_dir: output_dir.into(),
            epoch,
            verbose,
        }
    }

    /// Creates the output directory and its split directories; fails if it already exists.
    async fn prepare_output_dir(&self) -> Result<()> {
        let exists = || EvalError::OutputExists {
            path: self.output_dir.display().to_string(),
        };
        if tokio::fs::try_exists(&self.output_dir).await? {
            return Err(exists());
        }

        if let Some(parent) = self.output_dir.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::create_dir(&self.output_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                exists()
            } else {
                EvalError::IoError(e)
            }
        })?;
        for split in [Split::Train, Split::Eval] {
            tokio::fs::create_dir(self.output_dir.join(split.as_str())).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<M, L, S> EvalTask for LatentExportTask<M, L, S>
where
    M: DensityModel + Send + Sync,
    L: DataLoader + Send + Sync,
    S: Storage,
{
    fn label(&self) -> String {
        format!("save latent to {}", self.output_dir.display())
    }

    async fn evaluate(&mut self) -> Result<EvalOutcome> {
        self.prepare_output_dir().await?;

        let train = dataset_save_latent(
            &mut self.model,
            &self.train,
            &self.storage,
            Split::Train,
            self.verbose,
        )
        .await?;
        let eval = dataset_save_latent(
            &mut self.model,
            &self.eval,
            &self.storage,
            Split::Eval,
            self.verbose,
        )
        .await?;

        Ok(EvalOutcome::Latents(vec![train, eval]))
    }

    async fn persist(&self, outcome: &EvalOutcome) -> Result<String> {
        let EvalOutcome::Latents(splits) = outcome else {
            return Err(EvalError::ConfigError {
                message: "latent export can only persist latent summaries".to_string(),
            });
        };

        let report = LatentExportReport {
            epoch: self.epoch,
            completed_at: chrono::Utc::now().to_rfc3339(),
            splits,
        };
        let json = serde_json::to_string_pretty(&report)?;
        self.storage.write_file("summary.json", json.as_bytes()).await?;

        Ok(self.output_dir.display().to_string())
    }
}
