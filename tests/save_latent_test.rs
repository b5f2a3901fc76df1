#![cfg(feature = "cli")]

mod common;

use anyhow::Result;
use clap::Parser;
use common::{Fixture, EVAL_ROWS, TRAIN_ROWS};
use flow_eval::{CliConfig, EvalError};
use std::fs;

fn save_latent_config(fixture: &Fixture, output: Option<&str>) -> Result<CliConfig> {
    let model = fixture.model_arg();
    let mut args = vec!["flow-eval", "--model", model.as_str(), "--batch-size", "2", "save-latent"];
    if let Some(output) = output {
        args.extend_from_slice(&["--output", output]);
    }
    Ok(CliConfig::try_parse_from(args)?)
}

#[tokio::test]
async fn test_save_latent_writes_both_splits() -> Result<()> {
    let fixture = Fixture::new("none", &TRAIN_ROWS, &EVAL_ROWS);
    let output_dir = fixture.dir.path().join("exports").join("toy_latents");
    let output = output_dir.to_str().unwrap().to_string();

    let written = flow_eval::app::run(&save_latent_config(&fixture, Some(&output))?).await?;
    assert_eq!(written, output);

    // 3 train examples in batches of 2 and 1.
    for name in ["latent_0_0.json", "latent_0_1.json", "latent_1_0.json"] {
        assert!(output_dir.join("train").join(name).exists(), "missing {}", name);
    }
    assert!(!output_dir.join("train").join("latent_1_1.json").exists());
    assert!(output_dir.join("eval").join("latent_2_0.json").exists());

    let ids = fs::read_to_string(output_dir.join("eval").join("id.txt"))?;
    let lines: Vec<&str> = ids.lines().collect();
    assert_eq!(lines.len(), EVAL_ROWS.len());
    // Identity flow: every ldj is exactly zero and keeps its decimal point.
    assert_eq!(lines[0], "eval/latent_0_0.json,\t0.0");
    assert_eq!(lines[4], "eval/latent_2_0.json,\t0.0");

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("summary.json"))?)?;
    assert_eq!(summary["epoch"], 7);
    assert_eq!(summary["splits"][0]["split"], "train");
    assert_eq!(summary["splits"][0]["examples"], 3);
    assert_eq!(summary["splits"][1]["examples"], 5);
    assert_eq!(summary["splits"][1]["mean_ldj"], 0.0);
    Ok(())
}

#[tokio::test]
async fn test_identity_flow_latents_equal_inputs() -> Result<()> {
    let fixture = Fixture::new("none", &TRAIN_ROWS, &EVAL_ROWS);
    let output_dir = fixture.dir.path().join("latents");
    let output = output_dir.to_str().unwrap().to_string();

    flow_eval::app::run(&save_latent_config(&fixture, Some(&output))?).await?;

    let record: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        output_dir.join("eval").join("latent_1_0.json"),
    )?)?;
    assert_eq!(record["shape"], serde_json::json!([1, 2, 2]));
    assert_eq!(record["data"], serde_json::json!([-1.0, 0.25, 0.75, 2.0]));
    Ok(())
}

#[tokio::test]
async fn test_save_latent_defaults_next_to_dataset() -> Result<()> {
    let fixture = Fixture::new("uniform", &TRAIN_ROWS, &EVAL_ROWS);

    let written = flow_eval::app::run(&save_latent_config(&fixture, None)?).await?;

    let expected = fixture.data_root().join("toy_new");
    assert_eq!(written, expected.display().to_string());
    assert!(expected.join("train").join("id.txt").exists());
    assert!(expected.join("eval").join("id.txt").exists());

    // Uniform dequantization with 4 bins subtracts 4 * ln(4) from every ldj.
    let ids = fs::read_to_string(expected.join("train").join("id.txt"))?;
    let ldj: f64 = ids
        .lines()
        .next()
        .and_then(|line| line.split(",\t").nth(1))
        .unwrap()
        .parse()?;
    assert!((ldj + 4.0 * 4f64.ln()).abs() < 1e-12);
    Ok(())
}

#[tokio::test]
async fn test_existing_output_dir_is_refused() -> Result<()> {
    let fixture = Fixture::new("none", &TRAIN_ROWS, &EVAL_ROWS);
    let output_dir = fixture.dir.path().join("latents");
    let output = output_dir.to_str().unwrap().to_string();

    flow_eval::app::run(&save_latent_config(&fixture, Some(&output))?).await?;
    let first_ids = fs::read_to_string(output_dir.join("train").join("id.txt"))?;

    let err = flow_eval::app::run(&save_latent_config(&fixture, Some(&output))?)
        .await
        .unwrap_err();

    assert!(matches!(err, EvalError::OutputExists { .. }));
    // The earlier export is left untouched.
    assert_eq!(
        fs::read_to_string(output_dir.join("train").join("id.txt"))?,
        first_ids
    );
    Ok(())
}
