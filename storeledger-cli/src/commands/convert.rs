//! Convert command - reports in, GnuCash CSV files out

use std::path::PathBuf;

use anyhow::{Context, Result};
use storeledger_core::InvalidRecordPolicy;

use super::get_context;
use crate::output;

pub struct ConvertOptions {
    pub files: Vec<PathBuf>,
    pub payments: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub skip_invalid: bool,
    pub no_persist: bool,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run(options: ConvertOptions) -> Result<()> {
    let mut ctx = get_context()?;
    if options.skip_invalid {
        ctx.conversion_service = ctx.conversion_service.with_policy(InvalidRecordPolicy::Skip);
    }

    let inputs = ctx.read_inputs(&options.files, options.payments.as_deref())?;
    let mut counter = ctx.open_counter()?;
    let first_id = counter.start();

    let result = ctx
        .conversion_service
        .convert(&inputs.sales, &inputs.deposits, &mut counter)
        .context("Conversion failed")?;

    let mut written = Vec::new();
    let mut committed = false;
    if !options.dry_run {
        let mut sink = ctx.sink(&options.output_dir);
        result.write_to(&mut sink)?;
        written = vec![sink.accounts_path(), sink.transactions_path(), sink.prices_path()];

        // the counter only moves once every file is on disk
        if !options.no_persist && ctx.config.persist_counter {
            counter.commit()?;
            committed = true;
        }
    }

    if options.json {
        let summary = serde_json::json!({
            "sales": inputs.sales.len(),
            "deposits": inputs.deposits.len(),
            "settled": inputs.settled,
            "dryRun": options.dry_run,
            "written": written,
            "counterCommitted": committed,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut rows = vec![
        ("Sales records", inputs.sales.len().to_string()),
        (
            "Deposits",
            format!("{} ({} settled)", inputs.deposits.len(), inputs.settled),
        ),
        ("Transactions", result.transactions.len().to_string()),
        ("Splits", result.split_count().to_string()),
        ("Price points", result.prices.len().to_string()),
        ("Accounts", result.accounts.len().to_string()),
    ];
    if let (Some(first), Some(last)) = (result.transactions.first(), result.transactions.last()) {
        rows.push(("Transaction numbers", format!("{} - {}", first.id, last.id)));
    }
    if result.empty_records > 0 {
        rows.push(("Records with no value", result.empty_records.to_string()));
    }
    println!("{}", output::summary_table(rows));

    if !result.rejected.is_empty() {
        output::warning(&format!("Skipped {} invalid record(s):", result.rejected.len()));
        for rejected in &result.rejected {
            output::bullet(&format!("{}: {}", rejected.record, rejected.reason));
        }
    }

    if options.dry_run {
        output::info("Dry run, nothing written");
        return Ok(());
    }

    for path in &written {
        println!("Wrote {}", path.display());
    }
    if committed {
        output::success(&format!("Transaction counter advanced {} -> {}", first_id, result.next_id));
    } else {
        output::info(&format!("Transaction counter left at {}", first_id));
    }

    Ok(())
}
