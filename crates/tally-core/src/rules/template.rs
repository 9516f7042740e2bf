//! Brace-format value templates (`"{}.{}"`, `"{2}-{1}-{0}"`).

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ExtractionError};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Next,
    Index(usize),
}

/// A value template applied to the captured groups of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Default template for `groups` captured amount groups: the single
    /// group as-is, or integer and fractional parts joined by a dot.
    ///
    /// Returns `None` when more than two groups are captured; such
    /// descriptors must configure their own template.
    pub fn default_amount(groups: usize) -> Option<Self> {
        let source = match groups {
            0 | 1 => "{}",
            2 => "{}.{}",
            _ => return None,
        };
        source.parse().ok()
    }

    /// Day, month, year capture order reversed into `YYYY-MM-DD`.
    pub fn default_date() -> Self {
        Self {
            source: "{2}-{1}-{0}".to_string(),
            segments: vec![
                Segment::Index(2),
                Segment::Literal("-".into()),
                Segment::Index(1),
                Segment::Literal("-".into()),
                Segment::Index(0),
            ],
        }
    }

    /// Pass-through of the first group.
    pub fn passthrough() -> Self {
        Self {
            source: "{}".to_string(),
            segments: vec![Segment::Next],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Format captured values into the template.
    pub fn format(&self, values: &[String]) -> Result<String, ExtractionError> {
        let mut out = String::new();
        let mut next = 0;
        for segment in &self.segments {
            let index = match segment {
                Segment::Literal(s) => {
                    out.push_str(s);
                    continue;
                }
                Segment::Next => {
                    next += 1;
                    next - 1
                }
                Segment::Index(i) => *i,
            };
            let value = values.get(index).ok_or_else(|| ExtractionError::Template {
                template: self.source.clone(),
                groups: values.len(),
                reason: format!("no captured group at index {}", index),
            })?;
            out.push_str(value);
        }
        Ok(out)
    }
}

impl FromStr for Template {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| ConfigError::Template {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        let (mut automatic, mut manual) = (false, false);

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(err("unterminated field")),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if field.is_empty() {
                        automatic = true;
                        segments.push(Segment::Next);
                    } else {
                        manual = true;
                        let index = field
                            .trim()
                            .parse()
                            .map_err(|_| err("field must be empty or a group index"))?;
                        segments.push(Segment::Index(index));
                    }
                }
                '}' => return Err(err("single '}' encountered")),
                c => literal.push(c),
            }
        }
        if automatic && manual {
            return Err(err("cannot mix automatic and manual field numbering"));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_template() {
        let t: Template = "{}.{}".parse().unwrap();
        assert_eq!(t.format(&strings(&["123456", "78"])).unwrap(), "123456.78");
    }

    #[test]
    fn test_indexed_template() {
        let t = Template::default_date();
        assert_eq!(t.format(&strings(&["04", "06", "2021"])).unwrap(), "2021-06-04");

        let parsed: Template = "{2}-{1}-{0}".parse().unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_literal_braces_and_text() {
        let t: Template = "FR{{{}}}-{}".parse().unwrap();
        assert_eq!(t.format(&strings(&["76", "001"])).unwrap(), "FR{76}-001");
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let t: Template = "{}{}.{}".parse().unwrap();
        let err = t.format(&strings(&["1", "2"])).unwrap_err();
        assert!(matches!(err, ExtractionError::Template { groups: 2, .. }));
    }

    #[test]
    fn test_malformed_templates() {
        assert!("{".parse::<Template>().is_err());
        assert!("}".parse::<Template>().is_err());
        assert!("{a}".parse::<Template>().is_err());
        assert!("{}{0}".parse::<Template>().is_err());
    }

    #[test]
    fn test_default_amount() {
        assert_eq!(Template::default_amount(1).unwrap().as_str(), "{}");
        assert_eq!(Template::default_amount(2).unwrap().as_str(), "{}.{}");
        assert!(Template::default_amount(3).is_none());
    }
}
