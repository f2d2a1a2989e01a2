//! Min-max scaling of numeric columns
//!
//! Columns are rescaled to `[0, 1]` with `(x - min) / (max - min)`. A constant
//! column (`min == max`) maps every value to [`NEUTRAL_VALUE`] and maps any
//! normalized value back to the constant, so no division by zero can occur.

use crate::{ensure_finite, MathError, Result};
use serde::{Deserialize, Serialize};

/// Normalized value used for every entry of a constant column
pub const NEUTRAL_VALUE: f64 = 0.5;

/// Min/max range of a single column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    min: f64,
    max: f64,
}

impl ScalingParameters {
    /// Create parameters from an explicit range
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Scaling range must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(MathError::InvalidInput(format!(
                "Scaling minimum {} exceeds maximum {}",
                min, max
            )));
        }

        Ok(Self { min, max })
    }

    /// Derive the range of a column
    pub fn fit(column: &[f64]) -> Result<Self> {
        if column.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit scaling parameters on an empty column".to_string(),
            ));
        }
        ensure_finite(column, "Column")?;

        let (min, max) = column
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Ok(Self { min, max })
    }

    /// Observed minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Observed maximum
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of the observed range
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Whether the column held a single distinct value
    pub fn is_constant(&self) -> bool {
        self.max == self.min
    }

    /// Map a raw value into normalized space
    pub fn transform(&self, value: f64) -> f64 {
        if self.is_constant() {
            return NEUTRAL_VALUE;
        }
        (value - self.min) / self.range()
    }

    /// Map a normalized value back to original units
    pub fn inverse_transform(&self, normalized: f64) -> f64 {
        if self.is_constant() {
            return self.min;
        }
        normalized * self.range() + self.min
    }

    /// Normalize every value of a slice
    pub fn transform_slice(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    /// Denormalize every value of a slice
    pub fn inverse_transform_slice(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse_transform(v)).collect()
    }
}

/// Scaling parameters for every feature column plus the target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    features: Vec<ScalingParameters>,
    target: ScalingParameters,
}

impl ColumnScaler {
    /// Fit one set of parameters per feature column and one for the target.
    ///
    /// `feature_columns` is column-major: `feature_columns[j][i]` is feature `j`
    /// of row `i`. Every column must have the same length as `target`.
    pub fn fit(feature_columns: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        if let Some((j, column)) = feature_columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != target.len())
        {
            return Err(MathError::InvalidInput(format!(
                "Feature column {} has {} values but the target has {}",
                j,
                column.len(),
                target.len()
            )));
        }

        let features = feature_columns
            .iter()
            .map(|c| ScalingParameters::fit(c))
            .collect::<Result<Vec<_>>>()?;
        let target = ScalingParameters::fit(target)?;

        Ok(Self { features, target })
    }

    /// Number of feature columns
    pub fn arity(&self) -> usize {
        self.features.len()
    }

    /// Parameters of feature column `j`
    pub fn feature(&self, j: usize) -> Option<&ScalingParameters> {
        self.features.get(j)
    }

    /// Parameters of the target column
    pub fn target(&self) -> &ScalingParameters {
        &self.target
    }

    /// Normalize one feature row with the fitted per-column parameters
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.features.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.features.len(),
                row.len()
            )));
        }
        ensure_finite(row, "Feature row")?;

        Ok(row
            .iter()
            .zip(&self.features)
            .map(|(&v, p)| p.transform(v))
            .collect())
    }

    /// Normalize a target value
    pub fn transform_target(&self, value: f64) -> f64 {
        self.target.transform(value)
    }

    /// Denormalize a target value
    pub fn inverse_target(&self, normalized: f64) -> f64 {
        self.target.inverse_transform(normalized)
    }
}
