//! Train/test partitioning of time-ordered datasets

use crate::data::Dataset;
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Training and test subsets of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Row index at which the test set starts: `floor(len * ratio)`
pub fn split_index(len: usize, ratio: f64) -> Result<usize> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ForecastError::ValidationError(format!(
            "Split ratio must be between 0 and 1 (exclusive), got {}",
            ratio
        )));
    }

    let index = (len as f64 * ratio).floor() as usize;
    if index == 0 {
        return Err(ForecastError::ValidationError(format!(
            "Split ratio {} leaves no training data for {} observations",
            ratio, len
        )));
    }
    if index >= len {
        return Err(ForecastError::ValidationError(format!(
            "Split ratio {} leaves no test data for {} observations",
            ratio, len
        )));
    }

    Ok(index)
}

/// Split preserving time order: the first `floor(len * ratio)` rows train, the rest test
pub fn split(dataset: &Dataset, ratio: f64) -> Result<Split> {
    let index = split_index(dataset.len(), ratio)?;
    let rows: Vec<usize> = (0..dataset.len()).collect();

    Ok(partition(dataset, &rows, index))
}

/// Split after a seeded uniform shuffle of the rows.
///
/// The same seed always yields the same partition. Test rows may precede
/// training rows in time, so this is only meaningful for callers that treat
/// observations as exchangeable.
pub fn split_shuffled(dataset: &Dataset, ratio: f64, seed: u64) -> Result<Split> {
    let index = split_index(dataset.len(), ratio)?;

    let mut rows: Vec<usize> = (0..dataset.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    Ok(partition(dataset, &rows, index))
}

fn partition(dataset: &Dataset, rows: &[usize], index: usize) -> Split {
    let (train_rows, test_rows) = rows.split_at(index);

    Split {
        train: dataset.select(train_rows),
        test: dataset.select(test_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sales() -> Dataset {
        Dataset::from_series(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0]).unwrap()
    }

    #[test]
    fn test_ordered_split() {
        let split = split(&sales(), 0.8).unwrap();

        assert_eq!(split.train.len(), 5);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.targets(), vec![100.0, 110.0, 105.0, 120.0, 130.0]);
        assert_eq!(split.test.targets(), vec![125.0, 140.0]);
    }

    #[rstest]
    #[case(2, 0.5)]
    #[case(7, 0.8)]
    #[case(10, 0.1)]
    #[case(10, 0.99)]
    #[case(3, 0.34)]
    fn test_split_sizes(#[case] len: usize, #[case] ratio: f64) {
        let values: Vec<f64> = (0..len).map(|i| i as f64 + 1.0).collect();
        let data = Dataset::from_series(&values).unwrap();

        match split(&data, ratio) {
            Ok(s) => {
                assert_eq!(s.train.len() + s.test.len(), len);
                assert!(!s.train.is_empty());
                assert!(!s.test.is_empty());
            }
            Err(e) => assert!(e.is_validation()),
        }
    }

    #[rstest]
    #[case::empty_train(3, 0.2)]
    #[case::single_observation(1, 0.5)]
    #[case::ratio_zero(5, 0.0)]
    #[case::ratio_one(5, 1.0)]
    #[case::ratio_nan(5, f64::NAN)]
    fn test_degenerate_split(#[case] len: usize, #[case] ratio: f64) {
        let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
        let data = Dataset::from_series(&values).unwrap();

        assert!(matches!(
            split(&data, ratio),
            Err(ForecastError::ValidationError(_))
        ));
    }

    #[test]
    fn test_shuffled_split_is_reproducible() {
        let data = sales();

        let a = split_shuffled(&data, 0.8, 7).unwrap();
        let b = split_shuffled(&data, 0.8, 7).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.train.len(), 5);
        assert_eq!(a.test.len(), 2);

        // Every observation lands in exactly one subset
        let mut all: Vec<i64> = a
            .train
            .observations()
            .iter()
            .chain(a.test.observations())
            .map(|o| o.index())
            .collect();
        all.sort();
        assert_eq!(all, (0..7).collect::<Vec<i64>>());
    }
}
