//! Config command - show or initialize settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use storeledger_core::config::SETTINGS_FILE;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the effective settings to settings.json
    Init,
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let ctx = get_context()?;
    let config = &ctx.config;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config.to_json()?)?);
                return Ok(());
            }

            println!("{}", "Settings".bold());
            println!("  Directory: {}", ctx.dir.display());
            println!();

            let accounts = &config.accounts;
            let table = output::summary_table([
                ("Base currency", config.base_currency.to_string()),
                (
                    "On invalid record",
                    format!("{:?}", config.on_invalid_record).to_lowercase(),
                ),
                ("Persist counter", config.persist_counter.to_string()),
                ("Receivable account", accounts.receivable.clone()),
                ("Proceeds accounts", accounts.proceeds.clone()),
                ("Commission accounts", accounts.commissions.clone()),
                ("Sales accounts", accounts.sales.clone()),
                ("Tax account", accounts.tax.clone()),
                ("Adjustment account", accounts.adjustment.clone()),
                ("Exchange accounts", accounts.exchange.clone()),
                (
                    "Output files",
                    format!(
                        "{}, {}, {}",
                        config.output.accounts, config.output.transactions, config.output.prices
                    ),
                ),
            ]);
            println!("{}", table);
        }
        ConfigCommands::Init => {
            config.save(&ctx.dir)?;
            output::success(&format!("Wrote {}", ctx.dir.join(SETTINGS_FILE).display()));
        }
    }

    Ok(())
}
