//! Pattern/template application for each descriptor field.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{Extraction, FieldIssue, FieldKind, FieldProblem, Record};
use crate::error::ExtractionError;
use crate::models::descriptor::{AmountSource, Descriptor, FieldRule};
use crate::rules::{captured_groups, parse_amount, parse_date, Template};

/// Decode an amount field from the last occurrence of its pattern.
///
/// Returns `Ok(None)` when the pattern does not match at all.
pub fn extract_amount(
    field: FieldKind,
    rule: &FieldRule,
    text: &str,
) -> Result<Option<f64>, ExtractionError> {
    let Some(matches) = rule.pattern.find_all(text) else {
        return Ok(None);
    };
    let Some(last) = matches.last() else {
        return Ok(None);
    };
    let groups = captured_groups(last);
    parse_amount(field.as_str(), &groups, rule.template.as_ref()).map(Some)
}

/// Decode the account id from the first match of its pattern.
pub fn extract_account(rule: &FieldRule, text: &str) -> Result<Option<String>, ExtractionError> {
    let Some(caps) = rule.pattern.search(text) else {
        return Ok(None);
    };
    let groups = captured_groups(&caps);
    let passthrough = Template::passthrough();
    let template = rule.template.as_ref().unwrap_or(&passthrough);
    template.format(&groups).map(Some)
}

/// Decode the statement date from the last occurrence of its pattern.
pub fn extract_date(rule: &FieldRule, text: &str) -> Result<Option<NaiveDate>, ExtractionError> {
    let Some(matches) = rule.pattern.find_all(text) else {
        return Ok(None);
    };
    let Some(last) = matches.last() else {
        return Ok(None);
    };
    let groups = captured_groups(last);
    let default = Template::default_date();
    let formatted = rule.template.as_ref().unwrap_or(&default).format(&groups)?;
    parse_date(&formatted)
        .map(Some)
        .ok_or_else(|| ExtractionError::Parse {
            field: FieldKind::Date.to_string(),
            value: formatted,
        })
}

/// Apply `descriptor` to `text`.
///
/// Each declared field is resolved independently; a field whose pattern
/// does not match, or whose value cannot be decoded, is left unset and
/// reported in [`Extraction::issues`].
pub fn extract(text: &str, descriptor: &Descriptor) -> Extraction {
    let name = descriptor.qualified_name();
    let mut issues = Vec::new();
    let mut record = Record {
        descriptor: name.clone(),
        bank_name: descriptor.bank_name.clone(),
        metadata: descriptor.metadata.clone(),
        ..Default::default()
    };

    if let Some(rule) = &descriptor.account {
        record.account = resolve(
            &mut issues,
            &name,
            FieldKind::Account,
            extract_account(rule, text),
        );
    }

    match &descriptor.amount {
        Some(AmountSource::Balance(rule)) => {
            record.balance = resolve(
                &mut issues,
                &name,
                FieldKind::Balance,
                extract_amount(FieldKind::Balance, rule, text),
            );
        }
        Some(AmountSource::CreditDebit { credit, debit }) => {
            let mut failed = Vec::new();
            if let Some(rule) = credit {
                match extract_amount(FieldKind::Credit, rule, text) {
                    Ok(Some(amount)) => record.balance = Some(amount),
                    outcome => failed.push((FieldKind::Credit, outcome)),
                }
            }
            if record.balance.is_none() {
                if let Some(rule) = debit {
                    match extract_amount(FieldKind::Debit, rule, text) {
                        Ok(Some(amount)) => record.balance = Some(-amount),
                        outcome => failed.push((FieldKind::Debit, outcome)),
                    }
                }
            }
            if record.balance.is_none() {
                for (field, outcome) in failed {
                    resolve(&mut issues, &name, field, outcome);
                }
            }
        }
        Some(AmountSource::Operation(rule)) => {
            record.operation = resolve(
                &mut issues,
                &name,
                FieldKind::Operation,
                extract_amount(FieldKind::Operation, rule, text),
            );
        }
        None => debug!("Descriptor {} declares no amount field", name),
    }

    if let Some(rule) = &descriptor.date {
        record.date = resolve(&mut issues, &name, FieldKind::Date, extract_date(rule, text));
    }

    Extraction { record, issues }
}

fn resolve<T>(
    issues: &mut Vec<FieldIssue>,
    descriptor: &str,
    field: FieldKind,
    outcome: Result<Option<T>, ExtractionError>,
) -> Option<T> {
    let problem = match outcome {
        Ok(Some(value)) => return Some(value),
        Ok(None) => {
            debug!("{}: {} not found", descriptor, field);
            FieldProblem::NotFound
        }
        Err(e) => {
            warn!("{}: {}: {}", descriptor, field, e);
            FieldProblem::Invalid(e)
        }
    };
    issues.push(FieldIssue {
        descriptor: descriptor.to_string(),
        field,
        problem,
    });
    None
}
