use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Tensor shape error: {0}")]
    TensorShapeError(#[from] ndarray::ShapeError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Sample count k={k} is not divisible by chunk size kbs={kbs}")]
    InvalidChunking { k: usize, kbs: usize },

    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("Cannot evaluate an empty batch")]
    EmptyBatch,

    #[error("Data loader '{name}' yielded no examples")]
    EmptyDataset { name: String },

    #[error("Output directory already exists: {path}")]
    OutputExists { path: String },

    #[error("Model error: {message}")]
    ModelError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Numerical,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a run that failed with this severity.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EvalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EvalError::ConfigError { .. }
            | EvalError::ConfigValidationError { .. }
            | EvalError::InvalidConfigValueError { .. }
            | EvalError::InvalidChunking { .. } => ErrorCategory::Configuration,
            EvalError::CsvError(_)
            | EvalError::InvalidData { .. }
            | EvalError::EmptyDataset { .. }
            | EvalError::SerializationError(_) => ErrorCategory::Data,
            EvalError::TensorShapeError(_)
            | EvalError::ShapeMismatch { .. }
            | EvalError::EmptyBatch
            | EvalError::ModelError { .. } => ErrorCategory::Numerical,
            EvalError::IoError(_) | EvalError::OutputExists { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EvalError::OutputExists { .. } => ErrorSeverity::Medium,
            EvalError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EvalError::OutputExists { path } => {
                format!("Remove '{}' or pass a different --output directory", path)
            }
            EvalError::InvalidChunking { k, .. } => {
                format!("Choose a --kbs value that divides k={}", k)
            }
            EvalError::ConfigError { .. }
            | EvalError::ConfigValidationError { .. }
            | EvalError::InvalidConfigValueError { .. } => {
                "Check args.toml in the model directory and the command line flags".to_string()
            }
            EvalError::CsvError(_)
            | EvalError::InvalidData { .. }
            | EvalError::EmptyDataset { .. } => {
                "Check that the dataset CSV files exist and contain one example per row"
                    .to_string()
            }
            EvalError::SerializationError(_) => {
                "Check that check/checkpoint.json is a valid checkpoint".to_string()
            }
            EvalError::TensorShapeError(_) | EvalError::ShapeMismatch { .. } => {
                "Check that data_shape in args.toml matches the checkpoint and the data"
                    .to_string()
            }
            EvalError::EmptyBatch | EvalError::ModelError { .. } => {
                "Re-run with --verbose to see which batch failed".to_string()
            }
            EvalError::IoError(_) => "Check file permissions and free disk space".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid evaluation settings: {}", self),
            ErrorCategory::Data => format!("Could not read evaluation data: {}", self),
            ErrorCategory::Numerical => format!("Evaluation failed: {}", self),
            ErrorCategory::Storage => format!("Could not write results: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
