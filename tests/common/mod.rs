#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A model directory plus dataset on disk, laid out the way the CLI expects.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// 1x2x2 examples; `train` and `eval` rows are flattened examples.
    pub fn new(dequantization: &str, train: &[[f64; 4]], eval: &[[f64; 4]]) -> Self {
        let dir = TempDir::new().unwrap();
        let data_root = dir.path().join("data");
        let model_dir = dir.path().join("runs").join("toy");

        fs::create_dir_all(data_root.join("toy")).unwrap();
        fs::create_dir_all(model_dir.join("check")).unwrap();

        fs::write(
            model_dir.join("args.toml"),
            format!(
                "dataset = \"toy\"\ndata_root = \"{}\"\ndata_shape = [1, 2, 2]\nbatch_size = 128\nepochs = 10\n\n[model]\ndequantization = \"{}\"\nnum_bins = 4\n",
                data_root.display(),
                dequantization
            ),
        )
        .unwrap();

        fs::write(
            model_dir.join("check").join("checkpoint.json"),
            r#"{"current_epoch": 7, "model": {"loc": [0.0, 0.0, 0.0, 0.0], "log_scale": [0.0, 0.0, 0.0, 0.0]}}"#,
        )
        .unwrap();

        write_csv(&data_root.join("toy").join("train.csv"), train);
        write_csv(&data_root.join("toy").join("eval.csv"), eval);

        Self { dir }
    }

    pub fn model_dir(&self) -> PathBuf {
        self.dir.path().join("runs").join("toy")
    }

    pub fn data_root(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn model_arg(&self) -> String {
        self.model_dir().to_str().unwrap().to_string()
    }
}

fn write_csv(path: &Path, rows: &[[f64; 4]]) {
    let body: String = rows
        .iter()
        .map(|r| format!("{},{},{},{}\n", r[0], r[1], r[2], r[3]))
        .collect();
    fs::write(path, body).unwrap();
}

pub const EVAL_ROWS: [[f64; 4]; 5] = [
    [0.0, 0.5, -0.5, 1.0],
    [1.0, 1.0, 0.0, 0.0],
    [-1.0, 0.25, 0.75, 2.0],
    [0.0, 0.0, 0.0, 0.0],
    [0.3, -0.3, 0.6, -0.6],
];

pub const TRAIN_ROWS: [[f64; 4]; 3] = [
    [1.0, 2.0, 3.0, 0.0],
    [0.0, 1.0, 2.0, 3.0],
    [3.0, 3.0, 1.0, 1.0],
];

/// Standard normal log density of one flattened example.
pub fn standard_normal_log_prob(row: &[f64; 4]) -> f64 {
    row.iter()
        .map(|v| -0.5 * (2.0 * std::f64::consts::PI).ln() - 0.5 * v * v)
        .sum()
}
