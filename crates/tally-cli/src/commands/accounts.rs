//! Accounts command - list the accounts of a ledger by type.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use tally_core::{Ledger, LedgerView, Value};

use super::{load_config, OutputFormat};

/// Arguments for the accounts command.
#[derive(Args)]
pub struct AccountsArgs {
    /// Ledger file written by `tally aggregate`
    #[arg(required = true)]
    ledger: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct AccountRow {
    id: String,
    #[serde(rename = "type")]
    account_type: String,
    color: Option<String>,
    first: Option<String>,
    last: Option<String>,
    balances: usize,
    operations: usize,
}

pub async fn run(args: AccountsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.ledger.exists() {
        anyhow::bail!("Ledger not found: {}", args.ledger.display());
    }
    let ledger = Ledger::load(&args.ledger)?;
    let view = LedgerView::new(&ledger, &config.accounts);

    let types: Vec<&str> = config.accounts.names().collect();
    let mut rows = Vec::new();
    for (account_type, ids) in view.group_by_type(&types) {
        for id in ids {
            let Some(entry) = ledger.get(&id) else {
                continue;
            };
            let properties = view.properties(&id).unwrap_or_default();
            let range = entry.date_range();
            rows.push(AccountRow {
                color: properties
                    .get("color")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                first: range.map(|(first, _)| first.to_string()),
                last: range.map(|(_, last)| last.to_string()),
                balances: entry.balances.len(),
                operations: entry.operations.len(),
                account_type: account_type.clone(),
                id,
            });
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(["id", "type", "color", "first", "last", "balances", "operations"])?;
            for row in &rows {
                wtr.write_record([
                    &row.id,
                    &row.account_type,
                    &row.color.clone().unwrap_or_default(),
                    &row.first.clone().unwrap_or_default(),
                    &row.last.clone().unwrap_or_default(),
                    &row.balances.to_string(),
                    &row.operations.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Text => print_groups(&rows),
    }

    Ok(())
}

fn print_groups(rows: &[AccountRow]) {
    if rows.is_empty() {
        println!("{} Ledger has no accounts.", style("ℹ").blue());
        return;
    }

    let mut current: Option<&str> = None;
    for row in rows {
        if current != Some(row.account_type.as_str()) {
            if current.is_some() {
                println!();
            }
            println!("{}", style(format!("▸ {}", row.account_type)).bold().cyan());
            current = Some(row.account_type.as_str());
        }
        let range = match (&row.first, &row.last) {
            (Some(first), Some(last)) => format!("{} .. {}", first, last),
            _ => "-".to_string(),
        };
        println!(
            "    {:<30} {:<24} {} balances, {} operations  {}",
            row.id,
            range,
            row.balances,
            row.operations,
            style(row.color.as_deref().unwrap_or("")).dim()
        );
    }
}
