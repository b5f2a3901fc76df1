//! Per-batch likelihood statistics.
//!
//! Every function takes a batch `x` whose axis 0 is the batch axis and asks
//! the model for one log density per example. Nats are averaged per example;
//! bits-per-dimension divide the summed log density by `ln 2` times the number
//! of elements in the batch.

use crate::core::dataset::RunningMean;
use crate::core::DensityModel;
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::validate_chunking;
use ndarray::{concatenate, Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis};
use std::f64::consts::LN_2;

/// Number of examples in `x`.
pub fn batch_len(x: &ArrayD<f64>) -> Result<usize> {
    match x.shape().first() {
        Some(&n) if n > 0 => Ok(n),
        _ => Err(EvalError::EmptyBatch),
    }
}

/// `log(sum(exp(lane)))`, shifted by the lane maximum. NaN anywhere in the
/// lane gives NaN; a lane of `-inf` gives `-inf`.
pub fn logsumexp(lane: ArrayView1<f64>) -> f64 {
    if lane.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let m = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !m.is_finite() {
        return m;
    }
    let s: f64 = lane.iter().map(|&v| (v - m).exp()).sum();
    m + s.ln()
}

pub fn logsumexp_axis(values: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
    values.map_axis(axis, logsumexp)
}

/// `k` copies of `x` concatenated along the batch axis.
pub fn repeat_batch(x: &ArrayD<f64>, k: usize) -> Result<ArrayD<f64>> {
    let views = vec![x.view(); k];
    Ok(concatenate(Axis(0), &views)?)
}

fn log_prob_checked<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
) -> Result<Array1<f64>> {
    let n = batch_len(x)?;
    let ll = model.log_prob(x)?;
    if ll.len() != n {
        return Err(EvalError::ShapeMismatch {
            context: "log_prob".to_string(),
            expected: format!("{} log densities", n),
            actual: ll.len().to_string(),
        });
    }
    Ok(ll)
}

/// Log-likelihood in nats, negated and averaged over the batch.
pub fn loglik_nats<M: DensityModel + ?Sized>(model: &mut M, x: &ArrayD<f64>) -> Result<f64> {
    let ll = log_prob_checked(model, x)?;
    let mean = ll.mean().ok_or(EvalError::EmptyBatch)?;
    Ok(-mean)
}

/// Log-likelihood in bits per dimension.
pub fn loglik_bpd<M: DensityModel + ?Sized>(model: &mut M, x: &ArrayD<f64>) -> Result<f64> {
    let ll = log_prob_checked(model, x)?;
    Ok(-ll.sum() / (LN_2 * x.len() as f64))
}

/// Same value as [`loglik_nats`]; reads better when the model is stochastic
/// and the value is only a lower bound.
pub fn elbo_nats<M: DensityModel + ?Sized>(model: &mut M, x: &ArrayD<f64>) -> Result<f64> {
    loglik_nats(model, x)
}

/// Same value as [`loglik_bpd`].
pub fn elbo_bpd<M: DensityModel + ?Sized>(model: &mut M, x: &ArrayD<f64>) -> Result<f64> {
    loglik_bpd(model, x)
}

/// Log densities of `copies` stacked copies of `x`, as a `(copies, batch)` matrix.
/// Row `i` holds the `i`-th copy.
fn stacked_log_prob<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    copies: usize,
) -> Result<Array2<f64>> {
    let n = batch_len(x)?;
    let stacked = repeat_batch(x, copies)?;
    let ll = log_prob_checked(model, &stacked)?;
    Ok(ll.into_shape_with_order((copies, n))?)
}

/// Importance-weighted bound per example, with all `k` samples in one pass.
pub fn iwbo<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
) -> Result<Array1<f64>> {
    validate_chunking(k, None)?;
    let ll = stacked_log_prob(model, x, k)?;
    Ok(logsumexp_axis(ll.view(), Axis(0)) - (k as f64).ln())
}

/// Importance-weighted bound per example, evaluated `kbs` samples at a time.
///
/// Peak memory scales with `kbs` instead of `k`. The samples are laid out in
/// the same order as [`iwbo`], so both agree for the same model draws.
pub fn iwbo_batched<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
    kbs: usize,
) -> Result<Array1<f64>> {
    validate_chunking(k, Some(kbs))?;
    let num_passes = k / kbs;

    let mut passes = Vec::with_capacity(num_passes);
    for pass in 0..num_passes {
        tracing::trace!("iwbo pass {}/{} ({} samples)", pass + 1, num_passes, kbs);
        passes.push(stacked_log_prob(model, x, kbs)?);
    }
    let views: Vec<ArrayView2<f64>> = passes.iter().map(|p| p.view()).collect();
    let ll = concatenate(Axis(0), &views)?;

    Ok(logsumexp_axis(ll.view(), Axis(0)) - (k as f64).ln())
}

fn iwbo_dispatch<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
    kbs: Option<usize>,
) -> Result<Array1<f64>> {
    match kbs {
        Some(kbs) => iwbo_batched(model, x, k, kbs),
        None => iwbo(model, x, k),
    }
}

/// IWBO in nats, negated and averaged over the batch.
pub fn iwbo_nats<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
    kbs: Option<usize>,
) -> Result<f64> {
    let bound = iwbo_dispatch(model, x, k, kbs)?;
    let mean = bound.mean().ok_or(EvalError::EmptyBatch)?;
    Ok(-mean)
}

/// IWBO in bits per dimension.
pub fn iwbo_bpd<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
    kbs: Option<usize>,
) -> Result<f64> {
    let bound = iwbo_dispatch(model, x, k, kbs)?;
    Ok(-bound.sum() / (x.len() as f64 * LN_2))
}

/// Monte-Carlo average of the bpd over `k` stochastic passes, `kbs` copies per pass.
pub fn mc_bpd_batched<M: DensityModel + ?Sized>(
    model: &mut M,
    x: &ArrayD<f64>,
    k: usize,
    kbs: usize,
) -> Result<f64> {
    validate_chunking(k, Some(kbs))?;
    let stacked = repeat_batch(x, kbs)?;
    let stacked_len = batch_len(&stacked)?;

    let mut bpd = RunningMean::default();
    for _ in 0..k / kbs {
        bpd.add(elbo_bpd(model, &stacked)?, stacked_len);
    }
    bpd.mean().ok_or(EvalError::EmptyBatch)
}
