use sales_forecast::data::{DataLoader, SalesColumns};
use sales_forecast::{ForecastPipeline, NeuralNetOptions, PipelineConfig, PredictorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Aggregates as returned by the sales data service
    let columns: SalesColumns = serde_json::from_str(
        r#"{
            "sales":   [38, 42, 41, 50, 47, 58, 53, 64, 68, 65, 70, 74],
            "wastes":  [2, 1, 3, 2, 4, 3, 5, 4, 3, 6, 4, 5],
            "demands": [30, 28, 35, 33, 36, 40, 38, 45, 44, 47, 49, 52],
            "offers":  [10, 12, 11, 15, 14, 18, 17, 20, 22, 21, 23, 25]
        }"#,
    )?;
    let data = DataLoader::from_sales_columns(columns)?;

    for predictor in [
        PredictorConfig::Multivariate,
        PredictorConfig::NeuralNet(NeuralNetOptions::default().with_epochs(500)),
    ] {
        // Evaluate with tomorrow's planned offers, expected wastes and demand
        let config = PipelineConfig::new(predictor).with_next_features(vec![26.0, 4.0, 53.0]);
        let result = ForecastPipeline::new(config)?.evaluate(&data)?;

        println!("{}", result);
    }

    Ok(())
}
