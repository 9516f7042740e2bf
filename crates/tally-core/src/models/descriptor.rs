//! Bank-specific extraction descriptors.
//!
//! A descriptor file is a JSON object mapping descriptor names to their
//! patterns, value templates and pass-through properties:
//!
//! ```json
//! {
//!     "Checking-monthly": {
//!         "bank-name": "BNP",
//!         "bank-pattern": "BNP PARIBAS SA",
//!         "account-pattern": "Compte n° (\\d+)",
//!         "balance-pattern": "SOLDE CREDITEUR AU \\d\\d\\.\\d\\d\\.\\d{4} ([\\d ]+),(\\d{2})",
//!         "date-pattern": "SOLDE CREDITEUR AU (\\d\\d)\\.(\\d\\d)\\.(\\d{4})",
//!         "account-type": "checking"
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::models::value::{Metadata, Value};
use crate::rules::{Pattern, RawPattern, Template};

/// Descriptor as decoded from a configuration file, before compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDescriptor {
    #[serde(rename = "bank-name")]
    pub bank_name: Option<String>,
    #[serde(rename = "bank-pattern")]
    pub bank_pattern: Option<RawPattern>,
    #[serde(rename = "account-pattern")]
    pub account_pattern: Option<RawPattern>,
    #[serde(rename = "account-value")]
    pub account_value: Option<String>,
    #[serde(rename = "balance-pattern")]
    pub balance_pattern: Option<RawPattern>,
    #[serde(rename = "balance-value")]
    pub balance_value: Option<String>,
    #[serde(rename = "credit-pattern")]
    pub credit_pattern: Option<RawPattern>,
    #[serde(rename = "credit-value")]
    pub credit_value: Option<String>,
    #[serde(rename = "debit-pattern")]
    pub debit_pattern: Option<RawPattern>,
    #[serde(rename = "debit-value")]
    pub debit_value: Option<String>,
    #[serde(rename = "operation-pattern")]
    pub operation_pattern: Option<RawPattern>,
    #[serde(rename = "operation-value")]
    pub operation_value: Option<String>,
    #[serde(rename = "date-pattern")]
    pub date_pattern: Option<RawPattern>,
    #[serde(rename = "date-value")]
    pub date_value: Option<String>,
    /// Name of the document text extractor to use.
    pub parser: Option<String>,
    /// Everything else is copied to the account metadata.
    #[serde(flatten)]
    pub extra: Metadata,
}

/// A pattern with its optional value template.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub pattern: Pattern,
    pub template: Option<Template>,
}

impl FieldRule {
    fn compile(
        field: &str,
        pattern: &RawPattern,
        template: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let pattern = Pattern::compile(pattern).map_err(|e| ConfigError::Pattern {
            field: format!("{}-pattern", field),
            reason: e.to_string(),
        })?;
        let template = template.map(str::parse::<Template>).transpose()?;
        Ok(Self { pattern, template })
    }
}

/// Where a descriptor's amount comes from. The variants are exclusive so
/// a record carries either a balance or an operation, never both.
#[derive(Debug, Clone)]
pub enum AmountSource {
    /// Absolute balance snapshot.
    Balance(FieldRule),
    /// Balance read as a positive credit, or else a negated debit.
    CreditDebit {
        credit: Option<FieldRule>,
        debit: Option<FieldRule>,
    },
    /// Signed operation delta.
    Operation(FieldRule),
}

/// Patterns that must all match for a descriptor to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandatoryField {
    Bank,
    Account,
    Date,
}

impl fmt::Display for MandatoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MandatoryField::Bank => "bank-pattern",
            MandatoryField::Account => "account-pattern",
            MandatoryField::Date => "date-pattern",
        })
    }
}

/// Compiled, read-only descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// Configuration group (descriptor file stem).
    pub group: String,
    /// Descriptor name inside its group.
    pub name: String,
    pub bank_name: String,
    pub bank: Option<Pattern>,
    pub account: Option<FieldRule>,
    pub amount: Option<AmountSource>,
    pub date: Option<FieldRule>,
    pub parser: Option<String>,
    /// Pass-through properties (share, color, account-type, ...).
    pub metadata: Metadata,
}

impl Descriptor {
    /// Validate and compile a raw descriptor.
    pub fn compile(
        group: impl Into<String>,
        name: impl Into<String>,
        raw: RawDescriptor,
    ) -> Result<Self, ConfigError> {
        let bank_name = raw.bank_name.ok_or(ConfigError::MissingBankName)?;

        let conflict = |first: &str, second: &str| ConfigError::Conflict {
            first: first.to_string(),
            second: second.to_string(),
        };
        let has_credit_debit = raw.credit_pattern.is_some() || raw.debit_pattern.is_some();
        if raw.balance_pattern.is_some() && has_credit_debit {
            return Err(conflict("balance-pattern", "credit-pattern/debit-pattern"));
        }
        if raw.operation_pattern.is_some() && (raw.balance_pattern.is_some() || has_credit_debit) {
            return Err(conflict("operation-pattern", "balance-pattern/credit-pattern/debit-pattern"));
        }

        let bank = raw
            .bank_pattern
            .as_ref()
            .map(Pattern::compile)
            .transpose()
            .map_err(|e| ConfigError::Pattern {
                field: "bank-pattern".into(),
                reason: e.to_string(),
            })?;

        let rule = |field: &str, pattern: &Option<RawPattern>, template: &Option<String>| {
            pattern
                .as_ref()
                .map(|p| FieldRule::compile(field, p, template.as_deref()))
                .transpose()
        };

        let account = rule("account", &raw.account_pattern, &raw.account_value)?;
        let date = rule("date", &raw.date_pattern, &raw.date_value)?;

        let amount = if let Some(balance) = rule("balance", &raw.balance_pattern, &raw.balance_value)? {
            Some(AmountSource::Balance(balance))
        } else if has_credit_debit {
            Some(AmountSource::CreditDebit {
                credit: rule("credit", &raw.credit_pattern, &raw.credit_value)?,
                debit: rule("debit", &raw.debit_pattern, &raw.debit_value)?,
            })
        } else {
            rule("operation", &raw.operation_pattern, &raw.operation_value)?
                .map(AmountSource::Operation)
        };

        let mut metadata = raw.extra;
        metadata.insert("bank-name".into(), Value::Text(bank_name.clone()));
        if let Some(parser) = &raw.parser {
            metadata.insert("parser".into(), Value::Text(parser.clone()));
        }

        Ok(Self {
            group: group.into(),
            name: name.into(),
            bank_name,
            bank,
            account,
            amount,
            date,
            parser: raw.parser,
            metadata,
        })
    }

    /// Mandatory patterns this descriptor declares. Omitted ones are not
    /// listed and do not disqualify the descriptor.
    pub fn mandatory_patterns(&self) -> impl Iterator<Item = (MandatoryField, &Pattern)> {
        [
            (MandatoryField::Bank, self.bank.as_ref()),
            (MandatoryField::Account, self.account.as_ref().map(|r| &r.pattern)),
            (MandatoryField::Date, self.date.as_ref().map(|r| &r.pattern)),
        ]
        .into_iter()
        .filter_map(|(field, pattern)| pattern.map(|p| (field, p)))
    }

    /// `group/name`, for diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}
