//! Factor correlation matrices and positive-semi-definite Cholesky factors.
//!
//! Given `n` independent standard normals `Z`, correlated normals are
//! produced as
//!
//! ```text
//! W = L * Z,    C = L * L^T
//! ```
//!
//! where `L` is lower triangular. Unlike a strict Cholesky decomposition,
//! [`psd_cholesky`] accepts singular (positive semi-definite) matrices such
//! as perfectly correlated factors: a column whose pivot vanishes is set to
//! zero, provided the remaining entries of that column are consistent.
//!
//! ```
//! use storage_models::models::CorrelationMatrix;
//!
//! let corr = CorrelationMatrix::two_factor(0.5).unwrap();
//! let chol = corr.cholesky().unwrap();
//!
//! let w = chol.transform(&[1.0, 0.0]);
//! assert!((w[1] - 0.5).abs() < 1e-12);
//! ```

use thiserror::Error;

/// Relative tolerance below which a Cholesky pivot is treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Symmetry and diagonal tolerance for correlation input.
const INPUT_TOLERANCE: f64 = 1e-10;

/// Error types for correlation operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrelationError {
    /// Matrix is not positive semi-definite
    #[error("Matrix is not positive semi-definite (failed at column {column})")]
    NotPositiveSemiDefinite {
        /// Column at which the decomposition failed
        column: usize,
    },
    /// Matrix dimensions are invalid
    #[error("Invalid matrix dimensions: expected {expected} elements, got {got}")]
    InvalidDimensions {
        /// Expected number of elements
        expected: usize,
        /// Supplied number of elements
        got: usize,
    },
    /// Diagonal elements are not 1.0
    #[error("Diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Diagonal index
        index: usize,
        /// Supplied value
        value: f64,
    },
    /// Matrix is not symmetric
    #[error("Matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row
        i: usize,
        /// Column
        j: usize,
    },
    /// Correlation value out of range [-1, 1]
    #[error("Correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row
        i: usize,
        /// Column
        j: usize,
        /// Supplied value
        value: f64,
    },
}

/// Validated factor correlation matrix (row-major, unit diagonal, symmetric).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl CorrelationMatrix {
    /// Create a correlation matrix from `dim * dim` row-major elements.
    ///
    /// Positive semi-definiteness is checked by [`CorrelationMatrix::cholesky`].
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > INPUT_TOLERANCE {
                return Err(CorrelationError::InvalidDiagonal { index: i, value: diag });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                let val_ij = data[i * dim + j];
                if (val_ij - data[j * dim + i]).abs() > INPUT_TOLERANCE {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
                if !(-1.0..=1.0).contains(&val_ij) {
                    return Err(CorrelationError::OutOfRange { i, j, value: val_ij });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Create from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CorrelationError> {
        let dim = rows.len();
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(&flat, dim)
    }

    /// Two-factor matrix from a scalar correlation.
    pub fn two_factor(rho: f64) -> Result<Self, CorrelationError> {
        Self::new(&[1.0, rho, rho, 1.0], 2)
    }

    /// Identity correlation (independent factors).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Lower triangular factor `L` with `C = L * L^T`.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CorrelationError> {
        psd_cholesky(&self.data, self.dim)
    }
}

/// Cholesky decomposition of a symmetric positive semi-definite matrix in
/// row-major order.
///
/// # Errors
///
/// - `InvalidDimensions` if `matrix.len() != dim * dim`
/// - `NotPositiveSemiDefinite` if a pivot is negative beyond tolerance, or a
///   zero pivot column has non-zero entries below it
pub fn psd_cholesky(matrix: &[f64], dim: usize) -> Result<CholeskyFactor, CorrelationError> {
    if matrix.len() != dim * dim {
        return Err(CorrelationError::InvalidDimensions {
            expected: dim * dim,
            got: matrix.len(),
        });
    }
    let scale = (0..dim)
        .map(|i| matrix[i * dim + i].abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let tolerance = PIVOT_TOLERANCE * scale;

    let n = dim;
    let mut lower = vec![0.0; n * n];

    for j in 0..n {
        let sum_sq: f64 = (0..j).map(|k| lower[j * n + k] * lower[j * n + k]).sum();
        let pivot = matrix[j * n + j] - sum_sq;

        if pivot < -tolerance {
            return Err(CorrelationError::NotPositiveSemiDefinite { column: j });
        }

        if pivot <= tolerance {
            // Degenerate column: the rest of it must already be explained
            for i in (j + 1)..n {
                let residual = matrix[i * n + j]
                    - (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum::<f64>();
                if residual.abs() > tolerance.sqrt() {
                    return Err(CorrelationError::NotPositiveSemiDefinite { column: j });
                }
            }
            continue;
        }

        let l_jj = pivot.sqrt();
        lower[j * n + j] = l_jj;
        for i in (j + 1)..n {
            let dot: f64 = (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum();
            lower[i * n + j] = (matrix[i * n + j] - dot) / l_jj;
        }
    }

    Ok(CholeskyFactor { data: lower, dim: n })
}

/// Lower triangular Cholesky factor.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j); zero above the diagonal.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Returns `L * z` for the first `dim` entries of `z`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        self.transform_into(z, &mut out);
        out
    }

    /// Writes `L * z` into `out`. Both slices must hold at least `dim` values.
    #[inline]
    pub fn transform_into(&self, z: &[f64], out: &mut [f64]) {
        let n = self.dim;
        for i in 0..n {
            let row = &self.data[i * n..i * n + i + 1];
            out[i] = row.iter().zip(z).map(|(l, z)| l * z).sum();
        }
    }
}
