//! sagres CLI binary.
//!
//! Provides the command-line interface for the sagres signal evaluation
//! engine: fetch (or synthesize) raw feeds, build the signal set, run the
//! quality gate and the evaluation pipeline, and write ranked results to
//! CSV.

mod cmd;
mod data;
mod output;

use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sagres")]
#[command(about = "Evaluate trading signals for predictive power", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full evaluation and write ranked results
    Evaluate {
        /// Asset symbol to analyze
        #[arg(short, long, default_value = "BTC")]
        asset: String,

        /// Hours of history to fetch
        #[arg(long, default_value = "168")]
        hours: i64,

        /// Use synthetic demo data instead of the live backend
        #[arg(long)]
        demo: bool,

        /// Number of top signals to keep in the summary (all by default)
        #[arg(short, long)]
        top_n: Option<usize>,

        /// Output directory for CSV files
        #[arg(short, long, default_value = "output")]
        output_dir: String,

        /// Also write per-signal rolling power CSVs
        #[arg(long)]
        include_rolling: bool,

        /// Path to an evaluation config JSON file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Run the data quality gate alone
    Quality {
        /// Asset symbol to analyze
        #[arg(short, long, default_value = "BTC")]
        asset: String,

        /// Hours of history to fetch
        #[arg(long, default_value = "168")]
        hours: i64,

        /// Use synthetic demo data instead of the live backend
        #[arg(long)]
        demo: bool,

        /// Path to an evaluation config JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the signals the registry builds
    Signals {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            asset,
            hours,
            demo,
            top_n,
            output_dir,
            include_rolling,
            config,
        } => {
            cmd::evaluate::run(
                &asset,
                hours,
                demo,
                top_n,
                &output_dir,
                include_rolling,
                config.as_deref(),
            )
            .await?;
        }
        Commands::Quality {
            asset,
            hours,
            demo,
            config,
            json,
        } => {
            cmd::quality::run(&asset, hours, demo, config.as_deref(), json).await?;
        }
        Commands::Signals { verbose } => {
            cmd::signals::run(verbose);
        }
    }

    Ok(())
}
