use anyhow::Context;
use log::info;
use ocd_severity::{Pipeline, PipelineConfig};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_args_and_env(std::env::args().skip(1))
        .context("Invalid configuration")?;
    let input = config.input_path.clone();

    let start = Instant::now();
    let outcome = Pipeline::new(config)
        .run()
        .with_context(|| format!("Severity pipeline failed for {}", input.display()))?;
    info!("Total run time {:?}", start.elapsed());

    println!("Best Accuracy: {}", outcome.accuracy);
    println!();
    println!("Classification Report:");
    println!("{}", outcome.report);
    print!("{}", outcome.heatmap.render_ansi());

    Ok(())
}
