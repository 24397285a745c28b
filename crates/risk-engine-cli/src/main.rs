mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::aggregate::AggregateArgs;
use commands::fit::FitArgs;
use commands::simulate::SimulateArgs;
use commands::tolerance::ToleranceArgs;
use commands::treatment::{RoiArgs, TreatmentArgs};

/// Quantitative risk Monte Carlo engine
#[derive(Parser)]
#[command(
    name = "qre",
    version,
    about = "Quantitative risk Monte Carlo engine",
    long_about = "Simulates annual losses for risk scenarios described by an occurrence \
                  probability and a 90% loss interval, and reports loss exceedance curves, \
                  VaR and expected shortfall, risk tolerance curves and treatment ROI."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine progress to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate scenarios and their portfolio total
    Simulate(SimulateArgs),
    /// Fit and render a two-point risk tolerance curve
    Tolerance(ToleranceArgs),
    /// Simulate current and residual stages and compute treatment ROI
    Treatment(TreatmentArgs),
    /// ROI of a treatment from known annual loss expectancies
    Roi(RoiArgs),
    /// Combine stored exceedance curves assuming independence
    Aggregate(AggregateArgs),
    /// Fit a lognormal severity to a 90% confidence interval
    Fit(FitArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Tolerance(args) => commands::tolerance::run_tolerance(args),
        Commands::Treatment(args) => commands::treatment::run_treatment(args),
        Commands::Roi(args) => commands::treatment::run_roi(args),
        Commands::Aggregate(args) => commands::aggregate::run_aggregate(args),
        Commands::Fit(args) => commands::fit::run_fit(args),
        Commands::Version => {
            println!("qre {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
