//! Balance command - query account balances from a ledger.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use serde::Serialize;

use tally_core::rules::parse_date;
use tally_core::{Ledger, LedgerView};

use super::{load_config, OutputFormat};

/// Arguments for the balance command.
#[derive(Args)]
pub struct BalanceArgs {
    /// Ledger file written by `tally aggregate`
    #[arg(required = true)]
    ledger: PathBuf,

    /// Day to query (default: today)
    date: Option<String>,

    /// Account ids to query (default: every account)
    #[arg(short, long)]
    account: Vec<String>,

    /// Report the change since January 1st instead of the balance
    #[arg(long)]
    yearly: bool,

    /// Print every known date instead of a single day
    #[arg(long)]
    history: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    balance: f64,
}

pub async fn run(args: BalanceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.ledger.exists() {
        anyhow::bail!("Ledger not found: {}", args.ledger.display());
    }
    let ledger = Ledger::load(&args.ledger)?;
    let view = LedgerView::new(&ledger, &config.accounts);

    let ids: Vec<&str> = if args.account.is_empty() {
        ledger.ids().collect()
    } else {
        for id in &args.account {
            if ledger.get(id).is_none() {
                anyhow::bail!("Unknown account: {}", id);
            }
        }
        args.account.iter().map(String::as_str).collect()
    };

    if args.history {
        return print_history(&view, &ids, &args);
    }

    let day = match args.date.as_deref() {
        Some(date) => parse_date(date).ok_or_else(|| anyhow::anyhow!("Invalid date: {}", date))?,
        None => Local::now().date_naive(),
    };
    let balances = view.balances_at(&ids, day, args.yearly);
    let rows: Vec<BalanceRow> = ids
        .iter()
        .zip(&balances)
        .map(|(account, balance)| BalanceRow {
            account: *account,
            balance: *balance,
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(["account", "balance"])?;
            for row in &rows {
                wtr.write_record([row.account.to_string(), format!("{:.2}", row.balance)])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Text => print_table(&rows, day, args.yearly),
    }

    Ok(())
}

fn print_table(rows: &[BalanceRow], day: NaiveDate, yearly: bool) {
    let title = if yearly { "Change since January 1st" } else { "Balances" };
    println!("{} on {}", style(title).bold(), day);
    println!();

    let width = rows.iter().map(|r| r.account.len()).max().unwrap_or(0).max(5);
    for row in rows {
        println!("  {:<width$}  {:>14.2}", row.account, row.balance, width = width);
    }
    println!("  {:<width$}  {:>14}", "", "--------------", width = width);
    let total: f64 = rows.iter().map(|r| r.balance).sum();
    println!(
        "  {:<width$}  {:>14}",
        style("Total").bold(),
        style(format!("{:.2}", total)).bold(),
        width = width
    );
}

fn print_history(view: &LedgerView, ids: &[&str], args: &BalanceArgs) -> anyhow::Result<()> {
    let history = view.balances_over(ids, args.yearly);

    match args.format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = history
                .iter()
                .map(|(day, values)| {
                    let balances: serde_json::Map<String, serde_json::Value> = ids
                        .iter()
                        .zip(values)
                        .map(|(id, v)| (id.to_string(), serde_json::json!(v)))
                        .collect();
                    serde_json::json!({ "date": day.to_string(), "balances": balances })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            let header: Vec<&str> = std::iter::once("date").chain(ids.iter().copied()).collect();
            wtr.write_record(&header)?;
            for (day, values) in &history {
                let record: Vec<String> = std::iter::once(day.to_string())
                    .chain(values.iter().map(|v| format!("{:.2}", v)))
                    .collect();
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Text => {
            for (day, values) in &history {
                let total: f64 = values.iter().sum();
                println!("{}  {:>14.2}", day, total);
            }
        }
    }

    Ok(())
}
