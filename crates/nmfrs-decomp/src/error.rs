//! Error type shared by the factorization engines

use nmfrs_kernels::KernelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NmfError {
    /// Out-of-range hyperparameter or unsupported divergence/algorithm pair
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation invoked on an engine or input that is not ready for it
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Target or warm-start tensors with unusable dimensions
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Non-finite result that survived the `eps` floors
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

pub type NmfResult<T> = Result<T, NmfError>;

impl From<KernelError> for NmfError {
    fn from(err: KernelError) -> Self {
        if err.is_numerical() {
            NmfError::NumericalInstability(err.to_string())
        } else {
            NmfError::InvalidShape(err.to_string())
        }
    }
}
