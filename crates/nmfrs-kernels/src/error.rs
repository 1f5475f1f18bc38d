//! Error types for divergence and small-matrix kernels
//!
//! Kernel failures carry the name of the operation that produced them so that
//! the engines can map them onto their own error kinds without losing context.

use std::fmt;

/// Error type for kernel operations
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Operand shapes disagree
    DimensionMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A matrix operand (or the trailing two axes of a batch) is not square
    NotSquare {
        operation: String,
        shape: Vec<usize>,
    },

    /// Empty input not allowed
    EmptyInput {
        operation: String,
        parameter: String,
    },

    /// Failure reported by the dense linear algebra backend
    Linalg { operation: String, message: String },

    /// A result that should be finite is not
    NonFinite { operation: String, context: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::DimensionMismatch {
                operation,
                expected,
                actual,
            } => write!(
                f,
                "{}: dimension mismatch - expected {:?}, got {:?}",
                operation, expected, actual
            ),

            KernelError::NotSquare { operation, shape } => {
                write!(f, "{}: matrix block is not square, shape {:?}", operation, shape)
            }

            KernelError::EmptyInput {
                operation,
                parameter,
            } => write!(
                f,
                "{}: empty input not allowed for parameter '{}'",
                operation, parameter
            ),

            KernelError::Linalg { operation, message } => {
                write!(f, "{}: linear algebra failure: {}", operation, message)
            }

            KernelError::NonFinite { operation, context } => {
                write!(f, "{}: non-finite result ({})", operation, context)
            }
        }
    }
}

impl std::error::Error for KernelError {}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        operation: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
    ) -> Self {
        KernelError::DimensionMismatch {
            operation: operation.into(),
            expected,
            actual,
        }
    }

    /// Create a not-square error
    pub fn not_square(operation: impl Into<String>, shape: &[usize]) -> Self {
        KernelError::NotSquare {
            operation: operation.into(),
            shape: shape.to_vec(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(operation: impl Into<String>, parameter: impl Into<String>) -> Self {
        KernelError::EmptyInput {
            operation: operation.into(),
            parameter: parameter.into(),
        }
    }

    /// Wrap a linear algebra backend failure
    pub fn linalg(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        KernelError::Linalg {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a non-finite result error
    pub fn non_finite(operation: impl Into<String>, context: impl Into<String>) -> Self {
        KernelError::NonFinite {
            operation: operation.into(),
            context: context.into(),
        }
    }

    /// True for failures caused by the numbers rather than by the shapes
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            KernelError::Linalg { .. } | KernelError::NonFinite { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = KernelError::dimension_mismatch("euclidean", vec![4, 3], vec![4, 2]);

        let msg = format!("{}", err);
        assert!(msg.contains("euclidean"));
        assert!(msg.contains("dimension mismatch"));
        assert!(msg.contains("[4, 3]"));
        assert!(msg.contains("[4, 2]"));
        assert!(!err.is_numerical());
    }

    #[test]
    fn test_not_square_display() {
        let err = KernelError::not_square("batch_inverse", &[2, 5, 2, 3]);

        let msg = format!("{}", err);
        assert!(msg.contains("batch_inverse"));
        assert!(msg.contains("not square"));
        assert!(msg.contains("[2, 5, 2, 3]"));
    }

    #[test]
    fn test_linalg_is_numerical() {
        let err = KernelError::linalg("hermitian_inverse", "singular matrix");

        assert!(err.is_numerical());
        assert!(format!("{}", err).contains("singular matrix"));
    }

    #[test]
    fn test_non_finite_display() {
        let err = KernelError::non_finite("solve_riccati", "bin 3, basis 1");

        let msg = format!("{}", err);
        assert!(msg.contains("solve_riccati"));
        assert!(msg.contains("bin 3, basis 1"));
        assert!(err.is_numerical());
    }
}
