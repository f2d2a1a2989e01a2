use approx::assert_relative_eq;
use rstest::rstest;
use sales_forecast::metrics::{
    mean_absolute_error, mean_absolute_percentage_error, mean_squared_error, r_squared,
    MetricsEngine,
};
use sales_forecast::ForecastError;

#[test]
fn test_metrics_on_known_values() {
    let actual = vec![100.0, 102.0, 104.0, 103.0, 105.0];
    let predicted = vec![101.0, 103.0, 103.0, 105.0, 104.0];

    let mae = mean_absolute_error(&actual, &predicted).unwrap();
    let mse = mean_squared_error(&actual, &predicted).unwrap();

    // Manual calculation
    // MAE = (|100-101| + |102-103| + |104-103| + |103-105| + |105-104|) / 5 = 6/5 = 1.2
    assert_relative_eq!(mae, 1.2, epsilon = 1e-10);
    // MSE = (1 + 1 + 1 + 4 + 1) / 5 = 1.6
    assert_relative_eq!(mse, 1.6, epsilon = 1e-10);

    let metrics = MetricsEngine::score(&actual, &predicted).unwrap();
    assert_relative_eq!(metrics.rmse, 1.6_f64.sqrt(), epsilon = 1e-10);
    assert_eq!(metrics.mae, mae);
}

#[test]
fn test_rmse_is_sqrt_of_mse() {
    let actual = [3.0, -0.5, 2.0, 7.0];
    let predicted = [2.5, 0.0, 2.0, 8.0];

    let metrics = MetricsEngine::score(&actual, &predicted).unwrap();

    assert_relative_eq!(metrics.rmse * metrics.rmse, metrics.mse, epsilon = 1e-12);
    assert!(metrics.mse >= 0.0 && metrics.mae >= 0.0 && metrics.mape >= 0.0);
    assert!(metrics.r2 <= 1.0);
}

#[test]
fn test_mape_uses_absolute_actuals() {
    let mape = mean_absolute_percentage_error(&[-10.0, 20.0], &[-12.0, 18.0]).unwrap();

    // (2/10 + 2/20) / 2 * 100
    assert_relative_eq!(mape, 15.0, epsilon = 1e-10);
}

#[test]
fn test_r2_below_zero_for_worse_than_mean() {
    let r2 = r_squared(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();

    // SS_res = 8, SS_tot = 2
    assert_relative_eq!(r2, -3.0, epsilon = 1e-10);
}

#[rstest]
#[case::mape(vec![0.0, 1.0, 2.0], "mape")]
#[case::r2(vec![4.0, 4.0, 4.0], "r2")]
fn test_undefined_metrics(#[case] actual: Vec<f64>, #[case] expected: &str) {
    let predicted = vec![1.0, 1.0, 1.0];

    match MetricsEngine::score(&actual, &predicted) {
        Err(ForecastError::UndefinedMetric { metric, reason }) => {
            assert_eq!(metric, expected);
            assert!(!reason.is_empty());
        }
        other => panic!("expected undefined {}, got {:?}", expected, other),
    }
}

#[rstest]
#[case(vec![1.0, 2.0], vec![1.0])]
#[case(vec![], vec![])]
#[case(vec![1.0, f64::INFINITY], vec![1.0, 2.0])]
fn test_invalid_inputs(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    assert!(matches!(
        MetricsEngine::score(&actual, &predicted),
        Err(ForecastError::ValidationError(_))
    ));
}

#[test]
fn test_metrics_serialize() {
    let metrics = MetricsEngine::score(&[125.0, 140.0], &[134.0, 141.0]).unwrap();

    let json = serde_json::to_value(metrics).unwrap();

    assert_eq!(json["mse"], 41.0);
    assert_eq!(json["mae"], 5.0);
    assert!(json["r2"].as_f64().unwrap() < 1.0);
}
