//! benchctl - acceptance evaluation for the power test bench
//!
//! Loads a captured measurement grid, runs the AVR or SMR acceptance rules
//! and exports the verdict with per-cell annotations plus the submission
//! sheet.

mod export;
mod grid;

use anyhow::{Context, Result};
use bench_acceptance::{AcceptanceError, AcceptanceResult, DeviceClass};
use clap::{Parser, Subcommand};
use colored::*;
use common::{BenchConfig, LogConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::export::{ExportPaths, ReportMeta, INSUFFICIENT_READINGS_NOTE};

#[derive(Parser)]
#[command(name = "benchctl")]
#[command(about = "Test-bench acceptance evaluation")]
#[command(long_about = "Test-bench acceptance evaluation

Commands:
  evaluate    Evaluate a captured grid and export the result
  headers     Print the grid headers for a device class
  config      Print the effective configuration

Examples:
  benchctl evaluate avr run.csv                 # Evaluate a regulator grid
  benchctl evaluate smr run.json -o /tmp/out    # Rectifier grid, custom output dir
  benchctl headers smr                          # Show rectifier grid headers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: config/benchctl.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a captured grid and export the result
    Evaluate {
        /// Device class: avr or smr
        class: DeviceClass,

        /// Grid file (.csv with header row, or .json array of records)
        input: PathBuf,

        /// Output directory (default: reports.default_output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// File name prefix (default: reports.file_prefix or a timestamp)
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Print the grid headers for a device class
    Headers {
        /// Device class: avr or smr
        class: DeviceClass,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = BenchConfig::resolve_path(cli.config.as_deref())?;
    let config = BenchConfig::load_from(&config_path).context("Failed to load configuration")?;

    let mut log_config = LogConfig::from_settings("benchctl", &config.logging);
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    common::init_with_config(&log_config)?;
    info!("Configuration: {}", config_path.display());
    debug!("Site: {} ({})", config.site.site_id, config.site.site_name);

    match cli.command {
        Commands::Evaluate {
            class,
            input,
            output_dir,
            prefix,
        } => evaluate(&config, class, &input, output_dir, prefix),
        Commands::Headers { class } => {
            println!("{}", class.display_name().bold());
            for column in class.columns() {
                println!("  {}", column);
            }
            Ok(())
        },
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        },
    }
}

fn evaluate(
    config: &BenchConfig,
    class: DeviceClass,
    input: &Path,
    output_dir: Option<PathBuf>,
    prefix: Option<String>,
) -> Result<()> {
    let records = grid::load_records(input)?;
    info!("Evaluating {} rows as {}", records.len(), class);

    let output_dir =
        output_dir.unwrap_or_else(|| PathBuf::from(&config.reports.default_output_dir));
    let prefix = prefix
        .or_else(|| config.reports.file_prefix.clone())
        .unwrap_or_else(export::timestamp_prefix);
    let paths = ExportPaths::new(&output_dir, &prefix, class);
    let meta = ReportMeta {
        site_id: config.site.site_id.clone(),
        site_name: config.site.site_name.clone(),
        device: class.display_name().to_string(),
        generated_at: chrono::Local::now().to_rfc3339(),
        rows: records.len(),
    };

    match class.evaluate_records(&records) {
        Ok(result) => {
            print_result(&result);
            export::export(&paths, class, &records, &meta, Some(&result), None)?;
            println!("Exported: {}", paths.json.display());
            println!("          {}", paths.csv.display());
            println!("          {}", paths.submission.display());
            if result.passed {
                Ok(())
            } else {
                anyhow::bail!("{} failed acceptance", class.display_name())
            }
        },
        Err(err @ AcceptanceError::InsufficientData { .. }) => {
            export::export(
                &paths,
                class,
                &records,
                &meta,
                None,
                Some(INSUFFICIENT_READINGS_NOTE),
            )?;
            println!("{}", INSUFFICIENT_READINGS_NOTE.yellow());
            println!("Exported: {}", paths.json.display());
            println!("          {}", paths.csv.display());
            println!("          {}", paths.submission.display());
            Err(err.into())
        },
        Err(err) => Err(err).with_context(|| format!("Cannot evaluate {}", input.display())),
    }
}

fn print_result(result: &AcceptanceResult) {
    for line in result.summary.lines() {
        if line == "RESULT: PASS" {
            println!("{}", line.green().bold());
        } else if line == "RESULT: FAIL" {
            println!("{}", line.red().bold());
        } else if line.starts_with("Invalid") {
            println!("{}", line.red());
        } else if line.starts_with("Abnormal") {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }
    for warning in &result.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
}
