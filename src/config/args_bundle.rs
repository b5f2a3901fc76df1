use crate::adapters::flow::Dequantization;
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Training-time arguments saved next to a checkpoint as `args.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgsBundle {
    pub dataset: String,
    pub data_root: String,
    pub data_shape: Vec<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub epochs: Option<u64>,
    #[serde(default)]
    pub model: ModelArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DequantizationKind {
    #[default]
    None,
    Uniform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArgs {
    #[serde(default)]
    pub dequantization: DequantizationKind,
    #[serde(default = "default_num_bins")]
    pub num_bins: u32,
}

impl Default for ModelArgs {
    fn default() -> Self {
        Self {
            dequantization: DequantizationKind::None,
            num_bins: default_num_bins(),
        }
    }
}

fn default_batch_size() -> usize {
    64
}

fn default_num_bins() -> u32 {
    256
}

impl ModelArgs {
    pub fn dequantization(&self) -> Dequantization {
        match self.dequantization {
            DequantizationKind::None => Dequantization::None,
            DequantizationKind::Uniform => Dequantization::Uniform {
                num_bins: self.num_bins,
            },
        }
    }
}

impl ArgsBundle {
    /// 從 TOML 檔案載入
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EvalError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EvalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EvalError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Number of values in one example.
    pub fn dims(&self) -> usize {
        self.data_shape.iter().product()
    }

    pub fn split_path(&self, split: &str) -> PathBuf {
        Path::new(&self.data_root)
            .join(&self.dataset)
            .join(format!("{}.csv", split))
    }

    /// Where `save-latent` writes when no `--output` is given.
    pub fn default_output_dir(&self) -> PathBuf {
        Path::new(&self.data_root).join(format!("{}_new", self.dataset))
    }
}

impl Validate for ArgsBundle {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("dataset", &self.dataset)?;
        validation::validate_path("data_root", &self.data_root)?;
        validation::validate_shape("data_shape", &self.data_shape)?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        if self.model.dequantization == DequantizationKind::Uniform {
            validation::validate_positive_number(
                "model.num_bins",
                self.model.num_bins as usize,
                1,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_args_bundle() {
        let toml_content = r#"
dataset = "mnist"
data_root = "../../data"
data_shape = [1, 28, 28]
epochs = 500

[model]
dequantization = "uniform"
num_bins = 256
"#;

        let args = ArgsBundle::from_toml_str(toml_content).unwrap();
        assert_eq!(args.dataset, "mnist");
        assert_eq!(args.dims(), 784);
        assert_eq!(args.batch_size, 64);
        assert_eq!(args.epochs, Some(500));
        assert_eq!(
            args.model.dequantization(),
            Dequantization::Uniform { num_bins: 256 }
        );
        assert_eq!(
            args.split_path("train"),
            Path::new("../../data/mnist/train.csv")
        );
        assert_eq!(args.default_output_dir(), Path::new("../../data/mnist_new"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_model_table_is_optional() {
        let args = ArgsBundle::from_toml_str(
            r#"
dataset = "toy"
data_root = "data"
data_shape = [2]
"#,
        )
        .unwrap();
        assert_eq!(args.model.dequantization(), Dequantization::None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FLOW_EVAL_TEST_DATA_ROOT", "/datasets");

        let args = ArgsBundle::from_toml_str(
            r#"
dataset = "cifar10"
data_root = "${FLOW_EVAL_TEST_DATA_ROOT}"
data_shape = [3, 32, 32]
"#,
        )
        .unwrap();
        assert_eq!(args.data_root, "/datasets");

        std::env::remove_var("FLOW_EVAL_TEST_DATA_ROOT");
    }

    #[test]
    fn test_invalid_shape_fails_validation() {
        let args = ArgsBundle::from_toml_str(
            r#"
dataset = "toy"
data_root = "data"
data_shape = [0, 2]
"#,
        )
        .unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ArgsBundle::from_toml_str("dataset = ").unwrap_err();
        assert!(matches!(err, EvalError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_args_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"dataset = \"toy\"\ndata_root = \"data\"\ndata_shape = [4]\nbatch_size = 8\n")
            .unwrap();

        let args = ArgsBundle::from_file(temp_file.path()).unwrap();
        assert_eq!(args.batch_size, 8);
    }
}
