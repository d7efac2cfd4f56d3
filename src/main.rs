//! FX Hourly Signal Engine
//!
//! Command-line entry point: one-shot runs and an hourly watch loop.

use clap::{Parser, Subcommand};
use fx_signal_engine::{
    config::{Config, Variant},
    engine::{next_tick, render_table, SignalEngine},
    types::SignalResult,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fx-signals")]
#[command(about = "Hourly FX signals from per-symbol gradient boosting models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "fxsignals.toml")]
    config: String,

    /// Override the configured pipeline variant
    #[arg(long, value_enum)]
    variant: Option<Variant>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine once and print the signals
    Run {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run at every hour boundary until interrupted
    Watch {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(variant) = cli.variant {
        config.engine.variant = variant;
    }

    let engine = SignalEngine::from_config(&config)?;

    match cli.command {
        Commands::Run { json } => {
            let results = engine.run().await;
            print_results(&results, json)?;
        }
        Commands::Watch { json } => watch(&engine, json).await?,
    }

    Ok(())
}

async fn watch(engine: &SignalEngine, json: bool) -> anyhow::Result<()> {
    tracing::info!(symbols = engine.symbols().len(), "Watching for hourly runs");

    loop {
        let now = chrono::Utc::now();
        let tick = next_tick(now);
        let wait = (tick - now).to_std().unwrap_or_default();
        tracing::info!(next_run = %tick, "Waiting for next run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let results = engine.run().await;
                print_results(&results, json)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn print_results(results: &[SignalResult], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        println!("{}", render_table(results));
    }
    Ok(())
}
