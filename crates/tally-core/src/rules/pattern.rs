//! Single patterns and ordered pattern alternatives.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::normalize_text;

/// Pattern as written in a descriptor file: one regex or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPattern {
    Single(String),
    Alternatives(Vec<String>),
}

/// Compiled pattern. Alternatives are tried in order; the first one that
/// matches wins.
#[derive(Debug, Clone)]
pub enum Pattern {
    Single(Regex),
    Alternatives(Vec<Regex>),
}

impl Pattern {
    /// Compile a raw pattern, normalizing it the same way document text is.
    pub fn compile(raw: &RawPattern) -> Result<Self, regex::Error> {
        match raw {
            RawPattern::Single(p) => Ok(Pattern::Single(Regex::new(&normalize_text(p))?)),
            RawPattern::Alternatives(ps) => ps
                .iter()
                .map(|p| Regex::new(&normalize_text(p)))
                .collect::<Result<Vec<_>, _>>()
                .map(Pattern::Alternatives),
        }
    }

    /// All regexes in trial order.
    pub fn alternatives(&self) -> &[Regex] {
        match self {
            Pattern::Single(re) => std::slice::from_ref(re),
            Pattern::Alternatives(res) => res,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.alternatives().iter().any(|re| re.is_match(text))
    }

    /// First match of the first alternative that matches.
    pub fn search<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.alternatives().iter().find_map(|re| re.captures(text))
    }

    /// Every match of the first alternative that matches at least once.
    pub fn find_all<'t>(&self, text: &'t str) -> Option<Vec<Captures<'t>>> {
        self.alternatives().iter().find_map(|re| {
            let all: Vec<_> = re.captures_iter(text).collect();
            if all.is_empty() {
                None
            } else {
                Some(all)
            }
        })
    }
}

/// Captured groups of a match as strings.
///
/// A regex without groups yields the whole match; a group that did not
/// participate in the match yields an empty string.
pub fn captured_groups(caps: &Captures<'_>) -> Vec<String> {
    if caps.len() == 1 {
        return vec![caps[0].to_string()];
    }
    caps.iter()
        .skip(1)
        .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternatives(ps: &[&str]) -> Pattern {
        Pattern::compile(&RawPattern::Alternatives(ps.iter().map(|p| p.to_string()).collect()))
            .unwrap()
    }

    #[test]
    fn test_raw_pattern_deserialize() {
        let single: RawPattern = serde_json::from_str(r#""BNP PARIBAS""#).unwrap();
        assert_eq!(single, RawPattern::Single("BNP PARIBAS".into()));

        let list: RawPattern = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(list, RawPattern::Alternatives(vec!["A".into(), "B".into()]));
    }

    #[test]
    fn test_alternatives_first_match_wins() {
        let pattern = alternatives(&[r"Compte n° (\d+)", r"Account (\d+)"]);
        let caps = pattern.search("Account 42 / Account 43").unwrap();
        assert_eq!(&caps[1], "42");
        assert!(pattern.is_match("Compte n° 7"));
        assert!(!pattern.is_match("nothing here"));
    }

    #[test]
    fn test_find_all_uses_first_matching_alternative() {
        let pattern = alternatives(&[r"SOLDE (\d+)", r"TOTAL (\d+)"]);
        let all = pattern.find_all("TOTAL 1 TOTAL 2 TOTAL 3").unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(&all[2][1], "3");
        assert!(pattern.find_all("none").is_none());
    }

    #[test]
    fn test_captured_groups() {
        let re = Regex::new(r"(\d+),(\d+)?").unwrap();
        let caps = re.captures("12,").unwrap();
        assert_eq!(captured_groups(&caps), vec!["12".to_string(), String::new()]);

        let re = Regex::new(r"\d+").unwrap();
        let caps = re.captures("abc 99").unwrap();
        assert_eq!(captured_groups(&caps), vec!["99".to_string()]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Pattern::compile(&RawPattern::Single("(unclosed".into())).is_err());
    }
}
