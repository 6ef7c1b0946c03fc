//! payband CLI - compensation benchmark resolution
//!
//! Reads survey, level, alias and payroll tables from a directory of CSV
//! files and answers range and payroll questions against them:
//!
//! 1. `range`: min/mid/max for a band, region, family and level
//! 2. `stats`: internal pay statistics for a region, family and level
//! 3. `rebuild`: build and publish the benchmark index (optionally as CSV)
//! 4. `clear-cache`: drop every cached value
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` or pass `-v`.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use payband::config::Config;
use payband::engine::BenchmarkEngine;
use payband::index::export;
use payband::tables::CsvDirSource;
use payband::types::{InternalStats, Range};

/// Compensation benchmark ranges from market survey tables
///
/// Examples:
///   payband range X0 US SWE "L5 IC"        # Band range from the index or survey
///   payband stats US "Software Engineering" "L5 IC"
///   payband rebuild --out index.csv        # Publish and export the index
///   payband clear-cache                    # Force fresh table reads
#[derive(Parser, Debug)]
#[command(name = "payband")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding one `<table name>.csv` per table
    #[arg(short, long, default_value = ".", global = true)]
    pub data: PathBuf,

    /// Explicit config file (default: payband.toml found from --data upward)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    ///
    /// Prints the loaded config and timings, and raises the log level to
    /// debug unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a band range (X0, X1 or Y1)
    Range {
        band: String,
        region: String,
        /// Family code or exec family name
        family: String,
        /// Internal level, e.g. "L6.5 IC"
        level: String,
    },

    /// Internal pay statistics
    Stats {
        region: String,
        /// Family code or exec family name
        family: String,
        level: String,
    },

    /// Build and publish the benchmark index
    Rebuild {
        /// Also write the index as CSV to this file ("-" for stdout)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Print cache statistics afterwards
        #[arg(long)]
        stats: bool,
    },

    /// Remove every cached entry
    ClearCache,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    if cli.verbose {
        eprintln!("payband v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("   Data: {}", cli.data.display());
        eprintln!("{}", config.display_summary());
    }

    let source = CsvDirSource::new(&cli.data);
    let engine = BenchmarkEngine::open(config, Box::new(source))?;

    run(&cli, &engine)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "payband=debug" } else { "payband=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => {
            let dir = cli
                .data
                .canonicalize()
                .with_context(|| format!("Failed to resolve data directory: {}", cli.data.display()))?;
            Ok(Config::load(&dir))
        }
    }
}

fn run(cli: &Cli, engine: &BenchmarkEngine) -> Result<()> {
    let start = Instant::now();

    match &cli.command {
        Command::Range {
            band,
            region,
            family,
            level,
        } => {
            let range = engine.resolve_range(band, region, family, level)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&range)?);
            } else {
                println!("{}", format_range(&range));
            }
        }

        Command::Stats {
            region,
            family,
            level,
        } => {
            let stats = engine.resolve_internal_stats(region, family, level)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", format_stats(&stats));
            }
        }

        Command::Rebuild { out, stats } => {
            let index = engine.rebuild_index()?;
            if cli.verbose {
                eprintln!("✓ Published {} index rows ({:.2?})", index.len(), start.elapsed());
            }

            match out.as_deref() {
                Some(path) if path.as_os_str() == "-" => {
                    export::write_csv(&index, io::stdout().lock())?;
                }
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export::write_csv(&index, file)?;
                    if cli.verbose {
                        eprintln!("✓ Wrote {}", path.display());
                    }
                }
                None => {}
            }

            if *stats {
                let cache = engine.cache_stats();
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&cache)?);
                } else {
                    println!("Cache: {} entries, {}", cache.entries, cache.size_human());
                }
            }
        }

        Command::ClearCache => {
            let removed = engine.clear_all_caches()?;
            println!("Removed {} cache entries", removed);
        }
    }

    io::stdout().flush()?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0}", v)).unwrap_or_default()
}

fn format_range(range: &Range) -> String {
    format!("{}\t{}\t{}", cell(range.min), cell(range.mid), cell(range.max))
}

fn format_stats(stats: &InternalStats) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        cell(stats.min),
        cell(stats.median),
        cell(stats.max),
        stats.count
    )
}
