use crate::core::loss;
use crate::core::{DataLoader, DensityModel};
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{validate_chunking, Validate};

/// Sample-count-weighted mean of per-batch values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    total: f64,
    count: usize,
}

impl RunningMean {
    pub fn add(&mut self, value: f64, count: usize) {
        self.total += value * count as f64;
        self.count += count;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// The dataset-level reductions the evaluator knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    ElboNats,
    ElboBpd,
    IwboNats { k: usize, kbs: Option<usize> },
    IwboBpd { k: usize, kbs: Option<usize> },
    /// Mean bpd over `k` stochastic passes. Without `kbs` all passes are one stack.
    McBpd { k: usize, kbs: Option<usize> },
}

impl Statistic {
    /// Stem used for result file names, e.g. `iwbo1000` or `elbo_nats`.
    pub fn label(&self) -> String {
        match self {
            Statistic::ElboNats => "elbo_nats".to_string(),
            Statistic::ElboBpd => "elbo".to_string(),
            Statistic::IwboNats { k, .. } => format!("iwbo{}_nats", k),
            Statistic::IwboBpd { k, .. } => format!("iwbo{}", k),
            Statistic::McBpd { k, .. } => format!("mc{}", k),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Statistic::ElboNats | Statistic::IwboNats { .. } => "nats",
            _ => "bpd",
        }
    }

    pub fn evaluate_batch<M: DensityModel + ?Sized>(
        &self,
        model: &mut M,
        x: &ndarray::ArrayD<f64>,
    ) -> Result<f64> {
        match *self {
            Statistic::ElboNats => loss::elbo_nats(model, x),
            Statistic::ElboBpd => loss::elbo_bpd(model, x),
            Statistic::IwboNats { k, kbs } => loss::iwbo_nats(model, x, k, kbs),
            Statistic::IwboBpd { k, kbs } => loss::iwbo_bpd(model, x, k, kbs),
            Statistic::McBpd { k, kbs } => loss::mc_bpd_batched(model, x, k, kbs.unwrap_or(k)),
        }
    }
}

impl Validate for Statistic {
    fn validate(&self) -> Result<()> {
        match *self {
            Statistic::ElboNats | Statistic::ElboBpd => Ok(()),
            Statistic::IwboNats { k, kbs }
            | Statistic::IwboBpd { k, kbs }
            | Statistic::McBpd { k, kbs } => validate_chunking(k, kbs),
        }
    }
}

/// Runs `statistic` over every batch of `loader` and returns the
/// sample-count-weighted mean.
pub fn dataset_statistic<M, L>(
    model: &mut M,
    loader: &L,
    statistic: Statistic,
    verbose: bool,
) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    statistic.validate()?;

    let num_batches = loader.num_batches();
    let mut running = RunningMean::default();

    for (i, x) in loader.batches().enumerate() {
        let x = x?;
        let n = loss::batch_len(&x)?;
        let value = statistic.evaluate_batch(model, &x)?;
        running.add(value, n);

        if verbose {
            if let Some(mean) = running.mean() {
                tracing::info!("{}/{} {:.6}", i + 1, num_batches, mean);
            }
        }
    }

    let mean = running.mean().ok_or_else(|| EvalError::EmptyDataset {
        name: loader.name().to_string(),
    })?;
    tracing::debug!(
        "{} over '{}': {:.6} {} ({} examples)",
        statistic.label(),
        loader.name(),
        mean,
        statistic.unit(),
        running.count()
    );
    Ok(mean)
}

pub fn dataset_elbo_nats<M, L>(model: &mut M, loader: &L, verbose: bool) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    dataset_statistic(model, loader, Statistic::ElboNats, verbose)
}

pub fn dataset_elbo_bpd<M, L>(model: &mut M, loader: &L, verbose: bool) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    dataset_statistic(model, loader, Statistic::ElboBpd, verbose)
}

pub fn dataset_iwbo_nats<M, L>(
    model: &mut M,
    loader: &L,
    k: usize,
    kbs: Option<usize>,
    verbose: bool,
) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    dataset_statistic(model, loader, Statistic::IwboNats { k, kbs }, verbose)
}

pub fn dataset_iwbo_bpd<M, L>(
    model: &mut M,
    loader: &L,
    k: usize,
    kbs: Option<usize>,
    verbose: bool,
) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    dataset_statistic(model, loader, Statistic::IwboBpd { k, kbs }, verbose)
}

pub fn dataset_mc_bpd<M, L>(
    model: &mut M,
    loader: &L,
    k: usize,
    kbs: Option<usize>,
    verbose: bool,
) -> Result<f64>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
{
    dataset_statistic(model, loader, Statistic::McBpd { k, kbs }, verbose)
}
