//! Ordinary least squares solvers
//!
//! Contains implementations of:
//! - Simple linear regression (one regressor, closed form)
//! - Multiple linear regression via the normal equations `(X'X)b = X'y`

use crate::{ensure_finite, MathError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Pivots smaller than this fraction of the largest matrix entry count as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Slope and intercept of a fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Intercept and per-feature weights of a fitted hyperplane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl Coefficients {
    /// Evaluate the hyperplane at `row`; `row` must have one entry per weight
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.weights.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.weights.len(),
                row.len()
            )));
        }

        Ok(self.intercept + self.weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>())
    }
}

/// Fit `y = slope * x + intercept` by ordinary least squares
pub fn simple_least_squares(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 points for linear regression".to_string(),
        ));
    }
    ensure_finite(x, "x")?;
    ensure_finite(y, "y")?;

    let n = x.len() as f64;

    // Calculate means
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    // Calculate the slope (m)
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (&xi, &yi) in x.iter().zip(y) {
        numerator += (xi - x_mean) * (yi - y_mean);
        denominator += (xi - x_mean) * (xi - x_mean);
    }

    let scale = x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
    if denominator <= RANK_TOLERANCE * scale * scale {
        return Err(MathError::RankDeficient(
            "Cannot calculate slope: x values have no variance".to_string(),
        ));
    }

    let slope = numerator / denominator;

    // Calculate the intercept (b)
    let intercept = y_mean - slope * x_mean;

    Ok(LinearFit { slope, intercept })
}

/// Fit `y = intercept + sum(w_j * x_j)` by ordinary least squares.
///
/// `rows[i]` holds the features of observation `i`. The normal equations are
/// solved by Gaussian elimination with partial pivoting; a rank-deficient
/// design (collinear or constant columns) is reported rather than solved.
pub fn multiple_least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<Coefficients> {
    if rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but y has {} values",
            rows.len(),
            y.len()
        )));
    }
    let k = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|r| r.len() != k) {
        return Err(MathError::InvalidInput(
            "All rows must have the same number of features".to_string(),
        ));
    }
    // Fewer rows than unknowns can never give a full-rank design
    if rows.len() < k + 1 {
        return Err(MathError::RankDeficient(format!(
            "Need at least {} rows to fit {} features and an intercept, got {}",
            k + 1,
            k,
            rows.len()
        )));
    }
    for row in rows {
        ensure_finite(row, "Design row")?;
    }
    ensure_finite(y, "y")?;

    // Design matrix with a leading column of ones for the intercept
    let design = Array2::from_shape_fn((rows.len(), k + 1), |(i, j)| {
        if j == 0 {
            1.0
        } else {
            rows[i][j - 1]
        }
    });
    let target = Array1::from_vec(y.to_vec());

    let xt = design.t();
    let xtx = xt.dot(&design);
    let xty = xt.dot(&target);

    let beta = solve(xtx, xty)?;
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares produced non-finite coefficients".to_string(),
        ));
    }

    Ok(Coefficients {
        intercept: beta[0],
        weights: beta.iter().skip(1).copied().collect(),
    })
}

/// Solve `a * x = b` for square `a` using Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Err(MathError::RankDeficient("Design matrix is all zeros".to_string()));
    }
    let tolerance = RANK_TOLERANCE * scale;

    for col in 0..n {
        // Pick the row with the largest entry in this column
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);

        if a[[pivot_row, col]].abs() <= tolerance {
            return Err(MathError::RankDeficient(format!(
                "Design matrix is rank-deficient (column {} is a linear combination of others)",
                col
            )));
        }

        if pivot_row != col {
            for j in 0..n {
                a.swap([col, j], [pivot_row, j]);
            }
            b.swap(col, pivot_row);
        }

        // Eliminate entries below the pivot
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[[i, j]] * x[j];
        }
        x[i] = sum / a[[i, i]];
    }

    Ok(x)
}
