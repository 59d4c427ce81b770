use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use stockcast::application::prediction_service::PredictionService;
use stockcast::config::Config;
use stockcast::domain::ml::prediction::ModelKind;
use stockcast::infrastructure::csv_loader::CsvPriceLoader;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Next-day close forecast from daily OHLCV CSV files", long_about = None)]
struct Args {
    /// OHLCV CSV file(s) with Date,Open,High,Low,Close,Volume columns. Several files are predicted in parallel.
    #[arg(long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Model variant: regression or sequence
    #[arg(long, default_value = "regression")]
    model: ModelKind,

    /// Override MODEL_LOOKBACK
    #[arg(long)]
    lookback: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(lookback) = args.lookback {
        config.model.lookback = lookback;
    }
    let service = PredictionService::new(config).context("Failed to build prediction service")?;
    info!("Using {} model", args.model.label());

    let output = if let [path] = args.input.as_slice() {
        let table = CsvPriceLoader::from_path(path)
            .with_context(|| format!("Failed to load {:?}", path))?;
        let report = service
            .predict_table(table, args.model)
            .with_context(|| format!("Prediction failed for {:?}", path))?;
        serde_json::to_value(&report)?
    } else {
        let mut batch = Vec::with_capacity(args.input.len());
        for path in &args.input {
            let table = CsvPriceLoader::from_path(path)
                .with_context(|| format!("Failed to load {:?}", path))?;
            let missing = table.missing_columns();
            anyhow::ensure!(missing.is_empty(), "{:?} is missing columns {:?}", path, missing);
            let symbol = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            batch.push((symbol, table.into_series().series));
        }

        let results: Vec<_> = service
            .predict_many(&batch, args.model)
            .into_iter()
            .map(|p| match p.result {
                Ok(report) => json!({ "symbol": p.symbol, "report": report }),
                Err(error) => json!({ "symbol": p.symbol, "error": error }),
            })
            .collect();
        json!(results)
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);
    Ok(())
}
