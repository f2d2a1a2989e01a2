//! Evaluate every predictor on the same sales history in parallel and rank them by RMSE.

use sales_forecast::config::{NeuralNetOptions, OptimizerKind, PipelineConfig, PredictorConfig};
use sales_forecast::data::{DailySale, DataLoader};
use sales_forecast::evaluate_many;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Legacy export: dates are YY-DD-MM
    let records: Vec<DailySale> = serde_json::from_str(
        r#"[
            { "fecha": "24-01-03", "total": 100.0 },
            { "fecha": "24-02-03", "total": 108.0 },
            { "fecha": "24-03-03", "total": 104.0 },
            { "fecha": "24-04-03", "total": 117.0 },
            { "fecha": "24-05-03", "total": 121.0 },
            { "fecha": "24-06-03", "total": 119.0 },
            { "fecha": "24-07-03", "total": 131.0 },
            { "fecha": "24-08-03", "total": 135.0 },
            { "fecha": "24-09-03", "total": 133.0 },
            { "fecha": "24-10-03", "total": 142.0 }
        ]"#,
    )?;
    let data = DataLoader::from_daily_sales(&records)?;

    let configs = vec![
        PipelineConfig::new(PredictorConfig::SimpleLinear),
        PipelineConfig::new(PredictorConfig::Multivariate),
        PipelineConfig::new(PredictorConfig::NeuralNet(
            NeuralNetOptions::default().with_epochs(1000),
        )),
        PipelineConfig::new(PredictorConfig::NeuralNet(
            NeuralNetOptions::default()
                .with_epochs(1000)
                .with_optimizer(OptimizerKind::Sgd {
                    learning_rate: 0.05,
                    momentum: 0.9,
                }),
        )),
    ];

    let mut ranked = Vec::new();
    for (config, result) in configs.iter().zip(evaluate_many(&data, &configs)) {
        match result {
            Ok(result) => ranked.push(result),
            Err(e) => println!("{:?} failed: {}", config.predictor, e),
        }
    }
    ranked.sort_by(|a, b| a.metrics().rmse.total_cmp(&b.metrics().rmse));

    println!("{:<36} {:>10} {:>10} {:>10}", "Model", "RMSE", "R2", "Next");
    for result in &ranked {
        println!(
            "{:<36} {:>10.4} {:>10.4} {:>10.2}",
            result.model_name(),
            result.metrics().rmse,
            result.metrics().r2,
            result.predicted_value()
        );
    }

    Ok(())
}
