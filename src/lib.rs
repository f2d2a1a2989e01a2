//! # Sales Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`math`]: min-max scaling and least squares solvers (`sales_math`)
//! - [`forecast`]: datasets, predictors, metrics and the evaluation pipeline (`sales_forecast`)
//!
//! ## Example
//!
//! ```
//! use sales_forecast_workspace::forecast::{Dataset, ForecastPipeline, PipelineConfig};
//!
//! let data = Dataset::from_series(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0]).unwrap();
//! let result = ForecastPipeline::new(PipelineConfig::default())
//!     .unwrap()
//!     .evaluate(&data)
//!     .unwrap();
//!
//! assert_eq!(result.test_len(), 2);
//! ```

pub use sales_forecast as forecast;
pub use sales_math as math;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let params = math::ScalingParameters::fit(&[2.0, 4.0]).unwrap();
        assert_eq!(params.transform(3.0), 0.5);

        let data = forecast::Dataset::from_series(&[1.0, 2.0]).unwrap();
        assert_eq!(data.len(), 2);
    }
}
