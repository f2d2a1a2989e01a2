use sales_forecast::{Dataset, ForecastPipeline, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Daily sales totals for two weeks
    let sales = [
        100.0, 110.0, 105.0, 120.0, 130.0, 125.0, 140.0, 138.0, 150.0, 147.0, 155.0, 162.0,
        158.0, 170.0,
    ];
    let data = Dataset::from_series(&sales)?;
    println!("Loaded {} days of sales", data.len());

    // Fit a linear trend on the first 80% of the days, score it on the rest
    let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
    let result = pipeline.evaluate(&data)?;

    println!("{}", result);
    for (actual, predicted) in result.actuals().iter().zip(result.predictions()) {
        println!("  actual {:>8.2}  predicted {:>8.2}", actual, predicted);
    }

    Ok(())
}
