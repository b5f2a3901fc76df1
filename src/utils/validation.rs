use crate::utils::error::{EvalError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> EvalError {
    EvalError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be blank"));
    }
    Ok(())
}

/// `k` importance samples evaluated `kbs` at a time.
pub fn validate_chunking(k: usize, kbs: Option<usize>) -> Result<()> {
    match kbs {
        Some(kbs) if k == 0 || kbs == 0 || k % kbs != 0 => {
            Err(EvalError::InvalidChunking { k, kbs })
        }
        None if k == 0 => Err(EvalError::InvalidChunking { k, kbs: k }),
        _ => Ok(()),
    }
}

/// Every dimension of an example shape must be at least 1.
pub fn validate_shape(field_name: &str, shape: &[usize]) -> Result<()> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(invalid(
            field_name,
            format!("{:?}", shape),
            "Every dimension must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("model", "runs/mnist").is_ok());
        assert!(validate_path("model", "").is_err());
        assert!(validate_path("model", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("batch_size", 64, 1).is_ok());
        assert!(validate_positive_number("batch_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_chunking() {
        assert!(validate_chunking(1000, None).is_ok());
        assert!(validate_chunking(1000, Some(50)).is_ok());
        assert!(validate_chunking(1000, Some(1000)).is_ok());
        assert!(matches!(
            validate_chunking(10, Some(3)),
            Err(EvalError::InvalidChunking { k: 10, kbs: 3 })
        ));
        assert!(matches!(
            validate_chunking(10, Some(0)),
            Err(EvalError::InvalidChunking { k: 10, kbs: 0 })
        ));
        assert!(matches!(
            validate_chunking(0, None),
            Err(EvalError::InvalidChunking { k: 0, .. })
        ));
    }

    #[test]
    fn test_validate_shape() {
        assert!(validate_shape("data_shape", &[1, 28, 28]).is_ok());
        assert!(validate_shape("data_shape", &[]).is_err());
        assert!(validate_shape("data_shape", &[3, 0, 32]).is_err());
    }
}
