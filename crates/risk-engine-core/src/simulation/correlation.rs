//! Correlation-matrix validation and factorisation for correlated
//! frequency draws.

use crate::error::RiskEngineError;
use crate::RiskEngineResult;

const SYMMETRY_TOL: f64 = 1e-8;
const PIVOT_TOL: f64 = 1e-10;
const RESIDUAL_TOL: f64 = 1e-8;

/// Lower-triangular factor `L` with `L Lᵀ = C` for a validated correlation
/// matrix `C`. Semi-definite matrices are accepted: zero pivots produce zero
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationFactor {
    lower: Vec<Vec<f64>>,
}

impl CorrelationFactor {
    /// Validate `matrix` as an `expected_dim`-square, symmetric, unit-diagonal,
    /// positive semi-definite correlation matrix and factor it.
    pub fn new(matrix: &[Vec<f64>], expected_dim: usize) -> RiskEngineResult<Self> {
        let n = matrix.len();
        if n != expected_dim {
            return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                "Expected {expected_dim} rows (one per scenario), got {n}"
            )));
        }
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                    "Row {i} has {} columns, expected {n}",
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                    "Entry ({i}, {j}) is not finite"
                )));
            }
        }

        for i in 0..n {
            if (matrix[i][i] - 1.0).abs() > SYMMETRY_TOL {
                return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                    "Diagonal entry ({i}, {i}) must be 1, got {}",
                    matrix[i][i]
                )));
            }
            for j in (i + 1)..n {
                if (matrix[i][j] - matrix[j][i]).abs() > SYMMETRY_TOL {
                    return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                        "Not symmetric: ({i}, {j}) = {} but ({j}, {i}) = {}",
                        matrix[i][j], matrix[j][i]
                    )));
                }
                if matrix[i][j].abs() > 1.0 + SYMMETRY_TOL {
                    return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                        "Entry ({i}, {j}) = {} is outside [-1, 1]",
                        matrix[i][j]
                    )));
                }
            }
        }

        let lower = semidefinite_cholesky(matrix)?;
        Ok(CorrelationFactor { lower })
    }

    /// `out = L z`: turns independent standard normals into correlated ones.
    pub fn correlate(&self, z: &[f64], out: &mut [f64]) {
        for (i, row) in self.lower.iter().enumerate() {
            out[i] = row[..=i].iter().zip(z).map(|(l, z)| l * z).sum();
        }
    }
}

/// Cholesky factorisation that tolerates zero pivots. A negative pivot, or a
/// zero pivot whose column still carries weight, means the matrix is not
/// positive semi-definite.
fn semidefinite_cholesky(matrix: &[Vec<f64>]) -> RiskEngineResult<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];

    for j in 0..n {
        let pivot = matrix[j][j] - (0..j).map(|k| l[j][k] * l[j][k]).sum::<f64>();
        if pivot < -PIVOT_TOL {
            return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                "Not positive semi-definite (pivot {pivot:.3e} at column {j})"
            )));
        }

        if pivot <= PIVOT_TOL {
            for i in (j + 1)..n {
                let residual = matrix[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
                if residual.abs() > RESIDUAL_TOL {
                    return Err(RiskEngineError::InvalidCorrelationMatrix(format!(
                        "Not positive semi-definite (residual {residual:.3e} at ({i}, {j}))"
                    )));
                }
            }
            continue;
        }

        let diag = pivot.sqrt();
        l[j][j] = diag;
        for i in (j + 1)..n {
            let s = matrix[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            l[i][j] = s / diag;
        }
    }

    Ok(l)
}
