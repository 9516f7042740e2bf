//! Amount decoding from captured groups.

use lazy_static::lazy_static;
use regex::Regex;

use super::template::Template;
use crate::error::ExtractionError;

lazy_static! {
    // Whitespace and grouping separators inside a captured number
    static ref SEPARATORS: Regex = Regex::new(r"[\s,.]+").unwrap();
}

/// Strip whitespace and thousands/decimal separators from one captured
/// group ("123 456" -> "123456", "1.234" -> "1234").
pub fn clean_group(s: &str) -> String {
    SEPARATORS.replace_all(s, "").into_owned()
}

/// Decode an amount from the captured groups of its last match.
///
/// Groups are cleaned, then formatted with `template` or, when none is
/// configured, the default integer/fraction template. The formatted
/// string is parsed as a float.
pub fn parse_amount(
    field: &str,
    groups: &[String],
    template: Option<&Template>,
) -> Result<f64, ExtractionError> {
    let cleaned: Vec<String> = groups.iter().map(|g| clean_group(g)).collect();

    let default;
    let template = match template {
        Some(t) => t,
        None => {
            default = Template::default_amount(cleaned.len()).ok_or_else(|| {
                ExtractionError::TemplateRequired {
                    field: field.to_string(),
                    groups: cleaned.len(),
                }
            })?;
            &default
        }
    };

    let formatted = template.format(&cleaned)?;
    formatted
        .trim()
        .parse::<f64>()
        .map_err(|_| ExtractionError::Parse {
            field: field.to_string(),
            value: formatted,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_group() {
        assert_eq!(clean_group("123 456"), "123456");
        assert_eq!(clean_group("1.234.567"), "1234567");
        assert_eq!(clean_group(" 12,5 "), "125");
        assert_eq!(clean_group("-42"), "-42");
    }

    #[test]
    fn test_two_groups_integer_and_fraction() {
        let amount = parse_amount("balance", &groups(&["123 456", "78"]), None).unwrap();
        assert_eq!(amount, 123456.78);
    }

    #[test]
    fn test_single_group_passthrough() {
        assert_eq!(parse_amount("credit", &groups(&["75"]), None).unwrap(), 75.0);
        assert_eq!(parse_amount("debit", &groups(&["1 200"]), None).unwrap(), 1200.0);
    }

    #[test]
    fn test_explicit_template() {
        let template: Template = "-{}.{}".parse().unwrap();
        let amount = parse_amount("operation", &groups(&["50", "00"]), Some(&template)).unwrap();
        assert_eq!(amount, -50.0);

        let template: Template = "{0}{1}.{2}".parse().unwrap();
        let amount =
            parse_amount("balance", &groups(&["1", "234", "56"]), Some(&template)).unwrap();
        assert_eq!(amount, 1234.56);
    }

    #[test]
    fn test_three_groups_require_template() {
        let err = parse_amount("balance", &groups(&["1", "234", "56"]), None).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::TemplateRequired {
                field: "balance".into(),
                groups: 3
            }
        );
    }

    #[test]
    fn test_unparseable_amount() {
        let err = parse_amount("balance", &groups(&["abc"]), None).unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }

    #[test]
    fn test_deterministic() {
        let captured = groups(&["9 876", "54"]);
        let first = parse_amount("balance", &captured, None).unwrap();
        let second = parse_amount("balance", &captured, None).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
