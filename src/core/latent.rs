use crate::core::dataset::RunningMean;
use crate::core::loss::batch_len;
use crate::core::{DataLoader, DensityModel, Storage};
use crate::domain::model::{ExportSummary, LatentRecord, Split};
use crate::utils::error::{EvalError, Result};
use ndarray::Axis;

/// Storage-relative path of the latent for example `index` of batch `batch`.
pub fn latent_file_name(split: Split, batch: usize, index: usize) -> String {
    format!("{}/latent_{}_{}.json", split, batch, index)
}

pub fn id_file_name(split: Split) -> String {
    format!("{}/id.txt", split)
}

/// Maps every example of `loader` to its latent and writes one JSON file per
/// example, plus a `name,\tldj` line per example to the split's `id.txt`.
pub async fn dataset_save_latent<M, L, S>(
    model: &mut M,
    loader: &L,
    storage: &S,
    split: Split,
    verbose: bool,
) -> Result<ExportSummary>
where
    M: DensityModel + ?Sized,
    L: DataLoader + ?Sized,
    S: Storage,
{
    let num_batches = loader.num_batches();
    let id_file = id_file_name(split);
    let mut ldj_mean = RunningMean::default();

    for i in 0..num_batches {
        let x = loader.batch(i)?;
        let n = batch_len(&x)?;
        let (z, ldj) = model.z_ldj(&x)?;

        if z.shape().first() != Some(&n) || ldj.len() != n {
            return Err(EvalError::ShapeMismatch {
                context: "z_ldj".to_string(),
                expected: format!("{} latents and {} ldj terms", n, n),
                actual: format!("latents {:?}, {} ldj terms", z.shape(), ldj.len()),
            });
        }

        let mut id_lines = String::new();
        for b in 0..n {
            let name = latent_file_name(split, i, b);
            let record = LatentRecord::from_array(&z.index_axis(Axis(0), b).to_owned());
            let bytes = serde_json::to_vec(&record)?;
            storage.write_file(&name, &bytes).await?;

            id_lines.push_str(&format!("{},\t{:?}\n", name, ldj[b]));
            ldj_mean.add(ldj[b], 1);
        }
        storage.append_file(&id_file, id_lines.as_bytes()).await?;

        if verbose {
            tracing::info!("{}/{} for {}", i + 1, num_batches, split);
        }
    }

    let summary = ExportSummary {
        split,
        batches: num_batches,
        examples: ldj_mean.count(),
        mean_ldj: ldj_mean.mean(),
    };
    tracing::debug!("Exported {}", summary);
    Ok(summary)
}
