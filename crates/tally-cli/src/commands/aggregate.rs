//! Aggregate command - build a ledger from statement files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use tally_core::rules::{captured_groups, normalize_text, Pattern, RawPattern};
use tally_core::{
    collect_documents, Aggregator, BatchReport, DescriptorStore, TallyConfig, TextExtractors,
};

use super::load_config;

/// Arguments for the aggregate command.
#[derive(Args)]
pub struct AggregateArgs {
    /// Statement file or folder
    #[arg(required = true)]
    input: PathBuf,

    /// Descriptor directory (default from configuration)
    #[arg(short = 'c', long)]
    confs: Option<PathBuf>,

    /// Output ledger file
    #[arg(short, long, default_value = "accounts.json")]
    output: PathBuf,

    /// Print the ledger to stdout instead of writing it
    #[arg(long)]
    print: bool,

    /// Print the extracted text, or every match of REGEX in it
    #[arg(long, value_name = "REGEX", num_args = 0..=1, default_missing_value = "")]
    test: Option<String>,

    /// Text extractor to use with --test
    #[arg(long)]
    parser: Option<String>,

    /// Report the failing patterns of every descriptor when nothing matches
    #[arg(long)]
    diagnose: bool,
}

pub async fn run(args: AggregateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input not found: {}", args.input.display());
    }

    if let Some(regex) = args.test.as_deref() {
        return run_test(&args, &config, regex);
    }

    let start = Instant::now();

    let confs = args.confs.clone().unwrap_or_else(|| config.store.dir.clone());
    let (store, load_report) = DescriptorStore::load_dir(&confs, &config.store.extension)?;
    for rejection in &load_report.rejected {
        eprintln!(
            "{} Skipped {}: {}",
            style("⚠").yellow(),
            rejection.source,
            rejection.reason
        );
    }
    if store.is_empty() {
        anyhow::bail!("No descriptors found in {}", confs.display());
    }
    debug!(
        "Loaded {} descriptors from {} files",
        store.len(),
        load_report.files.len()
    );

    let documents = collect_documents(&args.input)?;
    let diagnose = args.diagnose || config.extraction.diagnose_unmatched;
    let mut aggregator = Aggregator::from_config(store, &config).with_diagnostics(diagnose);

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents",
            )?
            .progress_chars("=>-"),
    );
    if args.print {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut batch = BatchReport::default();
    for document in &documents {
        let result = aggregator.aggregate_document(document);
        batch.absorb(document, result);
        progress.inc(1);
    }
    progress.finish_and_clear();

    if args.print {
        println!("{}", batch.ledger.to_json()?);
    } else {
        batch.ledger.save(&args.output)?;
    }

    print_summary(&batch, &args, start);

    Ok(())
}

fn print_summary(batch: &BatchReport, args: &AggregateArgs, start: Instant) {
    let skipped: Vec<_> = batch.skipped().collect();
    let issues: Vec<_> = batch.issues().collect();

    eprintln!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        batch.documents.len() + batch.failed.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} aggregated, {} skipped, {} failed, {} accounts",
        style(batch.aggregated().count()).green(),
        style(skipped.len()).yellow(),
        style(batch.failed.len()).red(),
        batch.ledger.len()
    );

    if !skipped.is_empty() {
        eprintln!();
        eprintln!("{}", style("Skipped documents:").yellow());
        for (path, reason) in &skipped {
            eprintln!("  - {}: {}", path.display(), reason);
        }
    }

    if !issues.is_empty() {
        eprintln!();
        eprintln!("{}", style("Unset fields:").yellow());
        for (path, issue) in &issues {
            eprintln!("  - {}: {}", path.display(), issue);
        }
    }

    if !batch.failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed documents:").red());
        for failed in &batch.failed {
            eprintln!("  - {}: {}", failed.path.display(), failed.error);
        }
    }

    if !args.print {
        eprintln!();
        eprintln!(
            "{} Ledger written to {}",
            style("✓").green(),
            args.output.display()
        );
    }
}

/// Print the text of every input document, or the captured groups of
/// every match of `regex` in it.
fn run_test(args: &AggregateArgs, config: &TallyConfig, regex: &str) -> anyhow::Result<()> {
    let extractors = TextExtractors::with_builtin(config.extraction.default_extractor.clone());
    let pattern = if regex.is_empty() {
        None
    } else {
        Some(Pattern::compile(&RawPattern::Single(regex.to_string()))?)
    };

    for document in collect_documents(&args.input)? {
        let text = document_text(&extractors, &document, args.parser.as_deref())?;
        let Some(text) = text else {
            eprintln!("{} {}: no text", style("⚠").yellow(), document.display());
            continue;
        };

        match &pattern {
            None => println!("{}", text),
            Some(pattern) => {
                let matches: Vec<Vec<String>> = pattern
                    .find_all(&text)
                    .unwrap_or_default()
                    .iter()
                    .map(captured_groups)
                    .collect();
                println!("{}", serde_json::to_string(&matches)?);
            }
        }
    }

    Ok(())
}

fn document_text(
    extractors: &TextExtractors,
    path: &Path,
    parser: Option<&str>,
) -> anyhow::Result<Option<String>> {
    let Some(extractor) = extractors.select(path, parser) else {
        return Ok(None);
    };
    Ok(extractor.extract_text(path)?.map(|text| normalize_text(&text)))
}
