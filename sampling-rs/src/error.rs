use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("empty range: {lo} .. {hi} ({kind})")]
    EmptyRange {
        lo: String,
        hi: String,
        kind: &'static str,
    },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("breakpoints must be strictly increasing (index {index})")]
    NonIncreasing { index: usize },
    #[error("length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("weights sum to zero")]
    ZeroTotalWeight,
    #[error("unsupported vector dimension {0} (expected 2, 3 or 4)")]
    UnsupportedDimension(usize),
    #[error("ziggurat table construction failed: {0}")]
    TableConstruction(String),
}

pub type SampleResult<T> = Result<T, SampleError>;

impl SampleError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject NaN, infinities and values `<= 0`.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> SampleResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SampleError::invalid(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> SampleResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SampleError::invalid(name, format!("must be finite, got {value}")))
    }
}
