// bin/cryptoperf.rs - Cryptoperf command line
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cryptoperf_common::prelude::*;
use cryptoperf_core::prelude::*;
use cryptoperf_estimate::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "cryptoperf")]
#[command(about = "Benchmark cryptographic primitives and estimate processing time", long_about = None)]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Record store path, overriding the configuration
    #[arg(short, long, global = true)]
    db_path: Option<String>,

    /// Log level, overriding the configuration
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the benchmark grid and store the results
    Run {
        /// Comma separated algorithms to run (default: all)
        #[arg(short, long, value_delimiter = ',')]
        algorithms: Vec<String>,

        /// Repetitions averaged into each record
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Concurrent (algorithm, key size) pairs
        #[arg(short, long)]
        workers: Option<usize>,

        /// Small grid with short waits, for smoke runs
        #[arg(short, long)]
        quick: bool,
    },

    /// Estimate processing time for an input size
    Estimate {
        /// Algorithm name, e.g. AES, RSA, SHA-256
        #[arg(short, long)]
        algorithm: String,

        /// Input size in bytes
        #[arg(short, long)]
        size: u64,

        /// Operation (default: every measured operation)
        #[arg(short, long)]
        operation: Option<String>,

        /// Key size in bits or curve name
        #[arg(short, long)]
        key_size: Option<String>,

        /// One estimate per measured key size (needs --operation)
        #[arg(long)]
        by_key_size: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the aggregated rate table
    Rates {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write every stored record as a JSON array
    Export {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Write the configured generated samples to disk
    Samples {
        /// Output directory; files go under large/ and small/
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<CryptoperfConfig> {
    let quick = matches!(cli.command, Command::Run { quick: true, .. });
    let mut config = match &cli.config {
        Some(path) => CryptoperfConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None if quick => CryptoperfConfig::quick(),
        None => CryptoperfConfig::default(),
    };

    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    if let Command::Run {
        algorithms,
        iterations,
        workers,
        ..
    } = &cli.command
    {
        if !algorithms.is_empty() {
            config.grid.algorithms = algorithms.clone();
        }
        if let Some(iterations) = iterations {
            config.harness.iterations = *iterations;
        }
        if let Some(workers) = workers {
            config.harness.workers = *workers;
        }
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config validation failed: {}", e))?;
    Ok(config)
}

fn open_store(config: &CryptoperfConfig) -> Result<Arc<RocksRecordStore>> {
    let store = RocksRecordStore::open(config.db_path())
        .with_context(|| format!("Failed to open record store at {}", config.db_path))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    match cli.command {
        Command::Run { .. } => run(config).await,
        Command::Estimate {
            algorithm,
            size,
            operation,
            key_size,
            by_key_size,
            json,
        } => {
            let store = open_store(&config)?;
            let board = RateBoard::new();
            board.rebuild(&*store).await?;
            let estimator = TimeEstimator::from_board(&board);

            let results = match (operation.as_deref(), by_key_size) {
                (Some(op), true) => estimator.key_size_breakdown(&algorithm, op, size)?,
                (None, true) => anyhow::bail!("--by-key-size needs --operation"),
                (Some(op), false) => vec![estimator.estimate(&algorithm, op, size, key_size.as_deref())?],
                (None, false) => estimator.estimate_all(&algorithm, size, key_size.as_deref())?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    print_estimate(result);
                }
            }
            Ok(())
        }
        Command::Rates { json } => {
            let store = open_store(&config)?;
            let table = RateBoard::new().rebuild(&*store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&table.rows())?);
            } else {
                print_rates(&table);
            }
            Ok(())
        }
        Command::Export { out } => {
            let store = open_store(&config)?;
            let records = store.load_all().await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), &records)?;
            tracing::info!("Exported {} records to {}", records.len(), out.display());
            Ok(())
        }
        Command::Samples { out } => write_samples(&config.samples, &out),
    }
}

async fn run(config: CryptoperfConfig) -> Result<()> {
    tracing::info!("Starting cryptoperf benchmark run");
    tracing::info!("  Database: {}", config.db_path);
    tracing::info!("  Iterations: {}", config.harness.iterations);
    tracing::info!("  Workers: {}", config.harness.workers);
    tracing::info!(
        "  Throttle: {}% threshold, {}s cooldown cap",
        config.throttle.throttle_threshold,
        config.throttle.cool_down_cap
    );

    let store = open_store(&config)?;
    let samples = SampleSet::from_config(&config.samples)?;
    let plan = config.grid.resolve()?;
    let shutdown = Shutdown::new();

    // Set up shutdown handler
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Received shutdown signal - finishing in-flight cells...");
                signal.trigger();
            }
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    let harness = Harness::new(
        &config,
        store.clone(),
        samples,
        Arc::new(SystemProbe::new()),
        shutdown,
    )?;
    let report = harness.run(&plan).await?;

    println!(
        "Wrote {} records ({} new, {} updated) in {:.2}s",
        report.written(),
        report.inserted,
        report.updated,
        report.elapsed.as_secs_f64()
    );
    if report.cancelled {
        println!("Run cancelled, {} cells skipped", report.skipped);
    }
    for pair in &report.throttled {
        println!(
            "Throttled {} {}: {} attempts, {} cooldowns ({:.2}s cooling)",
            pair.algorithm,
            pair.key_size.as_ref().map(|k| k.to_string()).unwrap_or_else(|| "-".into()),
            pair.report.attempts,
            pair.report.cooldowns,
            pair.report.cooling.as_secs_f64()
        );
    }
    if !report.failures.is_empty() {
        println!("{} cells failed:", report.failures.len());
        for failure in &report.failures {
            println!(
                "  {} {} {} {}: {}",
                failure.algorithm,
                failure.key_size.as_ref().map(|k| k.to_string()).unwrap_or_else(|| "-".into()),
                failure.sample,
                failure.operation.map(|op| op.as_str()).unwrap_or("setup"),
                failure.error
            );
        }
    }

    let table = RateBoard::new().rebuild(&*store).await?;
    print_rates(&table);
    Ok(())
}

fn write_samples(config: &SampleConfig, out: &Path) -> Result<()> {
    let large = out.join("large");
    let small = out.join("small");

    for mb in &config.generated_large_mb {
        let path = GeneratedSample::megabytes(*mb).write_to_dir(&large)?;
        println!("{}", path.display());
    }
    for bytes in &config.generated_small_bytes {
        let path = GeneratedSample::bytes(*bytes).write_to_dir(&small)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn print_rates(table: &RateTable) {
    println!(
        "{:<14} {:<14} {:<8} {:>18} {:>8}",
        "ALGORITHM", "OPERATION", "KEY", "RATE", "SAMPLES"
    );
    for row in table.rows() {
        let key = row
            .key_size
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "all".to_string());
        println!(
            "{:<14} {:<14} {:<8} {:>13.3} {:<4} {:>8}",
            row.algorithm.name(),
            row.operation.as_str(),
            key,
            row.rate.value,
            row.rate.unit.label(),
            row.samples
        );
    }
    if table.skipped() > 0 {
        println!("({} records with unknown algorithms skipped)", table.skipped());
    }
}

fn print_estimate(result: &EstimationResult) {
    let key = result
        .key_size_used
        .as_ref()
        .map(|k| format!(" [{k}]"))
        .unwrap_or_default();
    println!(
        "{} {}{}: {} bytes in {:.6}s at {}",
        result.algorithm,
        result.operation,
        key,
        result.target_size,
        result.estimated_time_seconds,
        result.rate_used
    );
    if result.status == EstimateStatus::RateUnavailable {
        println!("  (measured rate is zero; no estimate available)");
    }
    for row in &result.intervals {
        println!(
            "  {} {:>14} bytes {:>12.6}s {:>12.3} MB/s",
            if row.is_target { "*" } else { " " },
            row.size,
            row.estimated_time,
            row.rate
        );
    }
}
