//! storeledger CLI - App Store reports to GnuCash

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config, convert, counter};

/// storeledger - turn App Store sales and payment reports into a balanced ledger
#[derive(Parser)]
#[command(name = "storeledger", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert sales reports (.txt) and payment reports (.csv) to GnuCash CSV files
    Convert {
        /// Report files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Payment log used to date deposits by settlement
        #[arg(long)]
        payments: Option<PathBuf>,
        /// Directory for accounts.csv, transactions.csv and prices.csv
        #[arg(long, short, default_value = ".")]
        output_dir: PathBuf,
        /// Skip invalid records instead of failing
        #[arg(long)]
        skip_invalid: bool,
        /// Do not advance the stored transaction counter
        #[arg(long)]
        no_persist: bool,
        /// Convert and report without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or set the transaction counter
    Counter {
        #[command(subcommand)]
        command: counter::CounterCommands,
    },

    /// Show or initialize settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            files,
            payments,
            output_dir,
            skip_invalid,
            no_persist,
            dry_run,
            json,
        } => convert::run(convert::ConvertOptions {
            files,
            payments,
            output_dir,
            skip_invalid,
            no_persist,
            dry_run,
            json,
        }),
        Commands::Counter { command } => counter::run(command),
        Commands::Config { command } => config::run(command),
    }
}
