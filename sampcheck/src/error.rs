use sampling_rs::SampleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("invalid arguments: {0}")]
    Args(String),
    #[error("failed to initialise tracing: {0}")]
    Tracing(String),
}

pub type CheckResult<T> = Result<T, CheckError>;
