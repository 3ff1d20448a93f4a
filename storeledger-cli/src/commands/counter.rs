//! Counter command - inspect or reset the transaction counter

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use storeledger_core::adapters::counter_file::CounterFile;

use super::get_context;

#[derive(Subcommand)]
pub enum CounterCommands {
    /// Show the next transaction number
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the next transaction number
    Set {
        /// Next transaction number to hand out
        next: u64,
    },
}

pub fn run(command: CounterCommands) -> Result<()> {
    let ctx = get_context()?;
    let path = ctx.counter_path();

    match command {
        CounterCommands::Show { json } => {
            let counter = ctx.open_counter()?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "next": counter.start(), "path": counter.path() })
                );
            } else {
                println!("Next transaction number: {}", counter.start().to_string().bold());
                println!("  Stored in: {}", counter.path().display());
            }
        }
        CounterCommands::Set { next } => {
            CounterFile::set(&path, next)?;
            println!("{}", format!("Next transaction number set to {}", next).green());
        }
    }

    Ok(())
}
