mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lbo::{AppreciateArgs, ScenarioArgs};
use commands::sensitivity::SensitivityArgs;

/// Leveraged buyout model calculations
#[derive(Parser)]
#[command(
    name = "lbo",
    version,
    about = "Leveraged buyout model calculations",
    long_about = "A CLI for a leveraged buyout model with decimal precision: entry \
                  capitalisation, unitranche and PIK schedules, capital structure \
                  roll-forward, exit MOIC/IRR, and 2-way sensitivity grids."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase diagnostic verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Purchase price and entry equity/debt split
    InitialValues(ScenarioArgs),
    /// Unitranche bullet schedule
    Bullet(ScenarioArgs),
    /// Payment-in-kind accrual schedule
    Pik(ScenarioArgs),
    /// Year-by-year capital stack
    CapitalStructure(ScenarioArgs),
    /// Exit enterprise value, equity proceeds, MOIC and IRR
    Exit(ScenarioArgs),
    /// Run the full pipeline for one scenario
    Model(ScenarioArgs),
    /// 2-way sensitivity of an exit metric
    Sensitivity(SensitivityArgs),
    /// Compound growth factor (1 + rate)^periods
    Appreciate(AppreciateArgs),
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

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::InitialValues(args) => commands::lbo::run_initial_values(args),
        Commands::Bullet(args) => commands::lbo::run_bullet(args),
        Commands::Pik(args) => commands::lbo::run_pik(args),
        Commands::CapitalStructure(args) => commands::lbo::run_capital_structure(args),
        Commands::Exit(args) => commands::lbo::run_exit(args),
        Commands::Model(args) => commands::lbo::run_model(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Appreciate(args) => commands::lbo::run_appreciate(args),
        Commands::Version => {
            println!("lbo {}", env!("CARGO_PKG_VERSION"));
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
