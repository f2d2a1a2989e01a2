//! Time-ordered sales data handling for forecast evaluation

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A single time step: its position in time, its feature vector and the observed target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    index: i64,
    features: Vec<f64>,
    target: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(index: i64, features: Vec<f64>, target: f64) -> Self {
        Self {
            index,
            features,
            target,
        }
    }

    /// Time index of the observation
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Feature values, in the dataset's column order
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Observed target value
    pub fn target(&self) -> f64 {
        self.target
    }
}

/// Ordered collection of observations sharing one feature layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    /// Names of the feature columns
    feature_names: Vec<String>,
    /// Observations in time order
    observations: Vec<Observation>,
}

impl Dataset {
    /// Create a dataset, checking arity, finiteness and time order
    pub fn new(feature_names: Vec<String>, observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::ValidationError(
                "Dataset must contain at least one observation".to_string(),
            ));
        }
        if feature_names.is_empty() {
            return Err(ForecastError::ValidationError(
                "Dataset must have at least one feature column".to_string(),
            ));
        }

        let arity = feature_names.len();
        for (i, obs) in observations.iter().enumerate() {
            if obs.features.len() != arity {
                return Err(ForecastError::ValidationError(format!(
                    "Observation {} has {} features, expected {}",
                    i,
                    obs.features.len(),
                    arity
                )));
            }
            if !obs.target.is_finite() || obs.features.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::ValidationError(format!(
                    "Observation {} contains a non-finite value",
                    i
                )));
            }
        }

        if let Some(w) = observations.windows(2).find(|w| w[1].index <= w[0].index) {
            return Err(ForecastError::ValidationError(format!(
                "Observations must be in strictly increasing time order (index {} follows {})",
                w[1].index, w[0].index
            )));
        }

        Ok(Self {
            feature_names,
            observations,
        })
    }

    /// Build a dataset from named feature columns and a target column.
    ///
    /// All columns must have the same length as the target; the row position
    /// becomes the time index.
    pub fn from_columns<S: Into<String>>(
        names: Vec<S>,
        columns: Vec<Vec<f64>>,
        target: Vec<f64>,
    ) -> Result<Self> {
        let feature_names: Vec<String> = names.into_iter().map(Into::into).collect();
        if feature_names.len() != columns.len() {
            return Err(ForecastError::ValidationError(format!(
                "Got {} feature names for {} columns",
                feature_names.len(),
                columns.len()
            )));
        }
        for (name, column) in feature_names.iter().zip(&columns) {
            if column.len() != target.len() {
                return Err(ForecastError::ValidationError(format!(
                    "Column '{}' has {} entries but the target has {}",
                    name,
                    column.len(),
                    target.len()
                )));
            }
        }

        let observations = target
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let features = columns.iter().map(|c| c[i]).collect();
                Observation::new(i as i64, features, t)
            })
            .collect();

        Self::new(feature_names, observations)
    }

    /// Build a univariate series whose only feature is the time index
    pub fn from_series(values: &[f64]) -> Result<Self> {
        let time = (0..values.len()).map(|i| i as f64).collect();
        Self::from_columns(vec!["time"], vec![time], values.to_vec())
    }

    /// Subset of this dataset in the given row order, without re-checking time order
    pub(crate) fn select(&self, rows: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            observations: rows.iter().map(|&i| self.observations[i].clone()).collect(),
        }
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset has no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of feature columns
    pub fn arity(&self) -> usize {
        self.feature_names.len()
    }

    /// Names of the feature columns
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Observations in dataset order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Feature vectors, one per observation
    pub fn feature_rows(&self) -> Vec<Vec<f64>> {
        self.observations.iter().map(|o| o.features.clone()).collect()
    }

    /// Values of feature column `j`
    pub fn feature_column(&self, j: usize) -> Option<Vec<f64>> {
        if j >= self.arity() {
            return None;
        }
        Some(self.observations.iter().map(|o| o.features[j]).collect())
    }

    /// All feature columns, column-major
    pub fn feature_columns(&self) -> Vec<Vec<f64>> {
        (0..self.arity())
            .map(|j| self.observations.iter().map(|o| o.features[j]).collect())
            .collect()
    }

    /// Target values
    pub fn targets(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.target).collect()
    }

    /// Time index of the last observation
    pub fn last_index(&self) -> Option<i64> {
        self.observations.last().map(|o| o.index)
    }

    /// Feature vector for the step after the last observation.
    ///
    /// Each column is extended by its last difference, so a time-index column
    /// yields `last + 1`. With a single observation the features carry forward.
    pub fn next_step_features(&self) -> Result<Vec<f64>> {
        match self.observations.as_slice() {
            [] => Err(ForecastError::ValidationError(
                "Cannot extrapolate from an empty dataset".to_string(),
            )),
            [only] => Ok(only.features.clone()),
            [.., prev, last] => Ok(last
                .features
                .iter()
                .zip(&prev.features)
                .map(|(&l, &p)| l + (l - p))
                .collect()),
        }
    }
}

/// Aggregate sales columns as delivered by the sales data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesColumns {
    pub sales: Vec<f64>,
    pub wastes: Vec<f64>,
    pub demands: Vec<f64>,
    pub offers: Vec<f64>,
}

/// Total sales of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySale {
    /// Date as `YY-DD-MM` (legacy export) or ISO `YYYY-MM-DD`
    #[serde(rename = "fecha")]
    pub date: String,
    /// Total sold that day
    pub total: f64,
}

/// Data loader that assembles datasets from external payloads
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Multivariate dataset with `offers`, `wastes` and `demands` as features and `sales` as target
    pub fn from_sales_columns(columns: SalesColumns) -> Result<Dataset> {
        let SalesColumns {
            sales,
            wastes,
            demands,
            offers,
        } = columns;

        Dataset::from_columns(
            vec!["offers", "wastes", "demands"],
            vec![offers, wastes, demands],
            sales,
        )
    }

    /// Parse [`SalesColumns`] from JSON and build the multivariate dataset
    pub fn from_json_str(json: &str) -> Result<Dataset> {
        let columns: SalesColumns = serde_json::from_str(json)?;
        Self::from_sales_columns(columns)
    }

    /// Univariate dataset of daily totals; the feature is days elapsed since the first record
    pub fn from_daily_sales(records: &[DailySale]) -> Result<Dataset> {
        let mut dated = records
            .iter()
            .map(|r| {
                if !r.total.is_finite() {
                    return Err(ForecastError::ValidationError(format!(
                        "Invalid total for {}: {}",
                        r.date, r.total
                    )));
                }
                Ok((parse_sale_date(&r.date)?, r.total))
            })
            .collect::<Result<Vec<_>>>()?;

        dated.sort_by_key(|(date, _)| *date);

        let first = match dated.first() {
            Some((date, _)) => *date,
            None => {
                return Err(ForecastError::ValidationError(
                    "No daily sales records".to_string(),
                ))
            }
        };

        let days = dated
            .iter()
            .map(|(date, _)| (*date - first).num_days() as f64)
            .collect();
        let totals = dated.iter().map(|(_, total)| *total).collect();

        Dataset::from_columns(vec!["days"], vec![days], totals)
    }

    /// Load a dataset from CSV with a header row; every column but `target_column` is a feature
    pub fn from_csv_reader<R: Read>(reader: R, target_column: &str) -> Result<Dataset> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let target_pos = headers
            .iter()
            .position(|h| h.trim() == target_column)
            .ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Target column '{}' not found in CSV header",
                    target_column
                ))
            })?;

        let names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_pos)
            .map(|(_, h)| h.trim().to_string())
            .collect();

        let mut columns = vec![Vec::new(); names.len()];
        let mut target = Vec::new();

        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut feature = 0;
            for (i, field) in record.iter().enumerate() {
                let value = field.trim().parse::<f64>().map_err(|e| {
                    ForecastError::ParseError(format!(
                        "Invalid number '{}' at line {}: {}",
                        field,
                        line + 2,
                        e
                    ))
                })?;
                if i == target_pos {
                    target.push(value);
                } else {
                    columns[feature].push(value);
                    feature += 1;
                }
            }
        }

        Dataset::from_columns(names, columns, target)
    }

    /// Load a dataset from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, target_column: &str) -> Result<Dataset> {
        let file = File::open(path)?;
        Self::from_csv_reader(file, target_column)
    }
}

/// Parse a sale date in either ISO `YYYY-MM-DD` or the legacy `YY-DD-MM` layout.
///
/// Legacy two-digit years below 50 belong to the 2000s, the rest to the 1900s.
pub fn parse_sale_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('-').collect();

    if parts.first().map(|p| p.len()) == Some(4) {
        return Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?);
    }

    if parts.len() != 3 {
        return Err(ForecastError::ParseError(format!("Invalid date: {}", raw)));
    }

    let numbers = parts
        .iter()
        .map(|p| p.parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ForecastError::ParseError(format!("Invalid date '{}': {}", raw, e)))?;

    let year = if numbers[0] < 50 {
        2000 + numbers[0]
    } else {
        1900 + numbers[0]
    };

    NaiveDate::from_ymd_opt(year as i32, numbers[2], numbers[1])
        .ok_or_else(|| ForecastError::ParseError(format!("Invalid date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_series() {
        let data = Dataset::from_series(&[100.0, 110.0, 105.0]).unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.arity(), 1);
        assert_eq!(data.feature_column(0).unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(data.targets(), vec![100.0, 110.0, 105.0]);
        assert_eq!(data.last_index(), Some(2));
        assert_eq!(data.next_step_features().unwrap(), vec![3.0]);
    }

    #[test]
    fn test_unequal_columns_rejected() {
        let result = Dataset::from_columns(
            vec!["offers"],
            vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]],
            vec![10.0, 20.0, 30.0, 40.0],
        );

        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_new_rejects_bad_observations() {
        let names = vec!["x".to_string()];

        assert!(Dataset::new(names.clone(), vec![]).is_err());
        assert!(Dataset::new(names.clone(), vec![Observation::new(0, vec![1.0, 2.0], 1.0)]).is_err());
        assert!(Dataset::new(names.clone(), vec![Observation::new(0, vec![f64::NAN], 1.0)]).is_err());

        let out_of_order = vec![
            Observation::new(1, vec![1.0], 1.0),
            Observation::new(0, vec![2.0], 2.0),
        ];
        assert!(Dataset::new(names, out_of_order).is_err());
    }

    #[test]
    fn test_next_step_single_observation() {
        let data = Dataset::from_columns(vec!["x"], vec![vec![4.0]], vec![1.0]).unwrap();
        assert_eq!(data.next_step_features().unwrap(), vec![4.0]);
    }

    #[test]
    fn test_parse_sale_date() {
        // Legacy layout is year-day-month
        assert_eq!(
            parse_sale_date("23-05-02").unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 5).unwrap()
        );
        assert_eq!(
            parse_sale_date("99-31-12").unwrap(),
            NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()
        );
        assert_eq!(
            parse_sale_date("2023-02-05").unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 5).unwrap()
        );

        assert!(parse_sale_date("23-32-01").is_err());
        assert!(parse_sale_date("not-a-date").is_err());
        assert!(parse_sale_date("2023-13-01").is_err());
    }

    #[test]
    fn test_daily_sales_sorted_by_date() {
        let records = vec![
            DailySale {
                date: "23-03-01".to_string(),
                total: 30.0,
            },
            DailySale {
                date: "23-01-01".to_string(),
                total: 10.0,
            },
        ];

        let data = DataLoader::from_daily_sales(&records).unwrap();
        assert_eq!(data.feature_column(0).unwrap(), vec![0.0, 2.0]);
        assert_eq!(data.targets(), vec![10.0, 30.0]);
    }
}
