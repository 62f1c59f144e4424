// Smart-City Feedback & Optimisation Engine - CLI
//
// Gathers citizen feedback (CSV or synthetic) and traffic (live or synthetic)
// for every registered location, prints the ranked recommendations, and
// writes recommendations.csv + report.json to the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smart_city_engine::{
    live_source, load_feedback_csv, EngineConfig, FeedbackGenerator, LocationRegistry, Pipeline,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "smart-city-engine")]
#[command(about = "Fuse citizen sentiment and traffic into city recommendations")]
#[command(version)]
struct Args {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, env = "SMART_CITY_CONFIG")]
    config: Option<PathBuf>,

    /// Read feedback from CSV (timestamp,location,feedback_text,source)
    #[arg(long)]
    feedback_csv: Option<PathBuf>,

    /// Number of synthetic feedback entries (ignored with --feedback-csv)
    #[arg(long)]
    entries: Option<usize>,

    /// Seed for synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Where recommendations.csv and report.json are written
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Skip live traffic entirely
    #[arg(long)]
    offline: bool,

    /// TomTom API key
    #[arg(long, env = "TOMTOM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smart_city_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // 1. Configuration
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(entries) = args.entries {
        config.feedback.entries = entries;
    }
    if args.offline {
        config.traffic.enabled = false;
    }

    let registry = Arc::new(LocationRegistry::with_default_locations());
    tracing::info!(locations = registry.len(), seed = ?config.seed, "Loaded location registry");

    // 2. Feedback
    let feedback = match &args.feedback_csv {
        Some(path) => load_feedback_csv(path, &registry)
            .with_context(|| format!("Failed to load feedback {}", path.display()))?,
        None => FeedbackGenerator::new(config.feedback.clone(), config.seed)
            .context("Invalid feedback generator configuration")?
            .generate(&registry),
    };
    tracing::info!(entries = feedback.len(), "Gathered citizen feedback");

    // 3. Run
    let api_key = args.api_key.clone().or_else(|| config.traffic.api_key.clone());
    let source = live_source(&config, api_key).context("Failed to build live traffic client")?;
    let pipeline = Pipeline::new(&config, registry, source).context("Invalid engine configuration")?;
    let report = pipeline.run(&feedback).await.context("Pipeline run failed")?;

    println!("\n🏙️  Smart-City Recommendations");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print!("{}", report.summary());

    // 4. Export
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let csv_path = args.output_dir.join("recommendations.csv");
    let json_path = args.output_dir.join("report.json");
    report.write_csv(&csv_path).context("Failed to write CSV export")?;
    report.write_json(&json_path).context("Failed to write JSON export")?;

    println!("\n✓ Wrote {}", csv_path.display());
    println!("✓ Wrote {}", json_path.display());
    println!("✓ Fingerprint {}", report.fingerprint()?);

    Ok(())
}
