use pretty_assertions::assert_eq;
use sales_forecast::config::{NeuralNetOptions, OptimizerKind, PipelineConfig, PredictorConfig};
use sales_forecast::{ForecastError, ForecastPipeline};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            "split_ratio": 0.7,
            "predictor": {{
                "kind": "neural_net",
                "hidden_units": 8,
                "optimizer": {{ "type": "sgd", "learning_rate": 0.05, "momentum": 0.5 }}
            }},
            "shuffle_before_split": true,
            "shuffle_seed": 5
        }}"#
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.split_ratio, 0.7);
    assert_eq!(config.shuffle_seed, Some(5));
    assert_eq!(
        config.predictor,
        PredictorConfig::NeuralNet(NeuralNetOptions {
            hidden_units: 8,
            epochs: 200,
            optimizer: OptimizerKind::Sgd {
                learning_rate: 0.05,
                momentum: 0.5
            },
            seed: 42,
        })
    );
}

#[test]
fn test_unknown_predictor_is_config_error() {
    let result = PipelineConfig::from_json_str(r#"{ "predictor": { "kind": "arima" } }"#);

    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_missing_config_file_is_io_error() {
    assert!(matches!(
        PipelineConfig::from_json_file("/nonexistent/pipeline.json"),
        Err(ForecastError::IoError(_))
    ));
}

#[test]
fn test_pipeline_rejects_invalid_config() {
    let seedless_shuffle = PipelineConfig {
        shuffle_before_split: true,
        shuffle_seed: None,
        ..PipelineConfig::default()
    };

    let error = ForecastPipeline::new(seedless_shuffle).unwrap_err();

    assert!(error.is_validation());
    assert!(ForecastPipeline::new(PipelineConfig::default().with_split_ratio(f64::NAN)).is_err());
}
