use thiserror::Error;

/// Failures raised by the simulation engine and its outer layers.
///
/// An undefined tail metric is not an error; see [`crate::analysis::TailMetric`].
#[derive(Debug, Error)]
pub enum SimError {
    /// A distribution parameter, mixture weight or confidence level is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine was asked to work on nothing (zero trials, empty distribution).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Fail with `InvalidConfiguration` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfiguration(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_positive_rejects_zero_negative_and_nan() {
        assert!(ensure_positive("lambda", 2.0).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ensure_positive("lambda", bad).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfiguration(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn messages_name_the_parameter() {
        let err = ensure_positive("gamma_scale", -3.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: gamma_scale must be finite and > 0, got -3"
        );
    }
}
