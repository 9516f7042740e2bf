//! Free-form date parsing for formatted date captures.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ISO_DATETIME: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$"
    ).unwrap();

    static ref COMPACT: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap();

    static ref TOKEN: Regex = Regex::new(r"[^\W_]+").unwrap();
}

/// Parse a date written in any of the common statement forms.
///
/// Accepted: `YYYY-MM-DD` (optionally followed by a time), `YYYYMMDD`,
/// `YYYY/MM/DD`, `DD.MM.YYYY`, `DD/MM/YYYY`, two-digit years, and
/// day / month name / year in English or French. When no part has four
/// digits the year is taken first, matching the default date template.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = ISO_DATETIME.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = COMPACT.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    let folded: String = s
        .chars()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&folded)
        .map(|m| strip_ordinal(m.as_str()))
        .collect();
    if tokens.len() != 3 {
        return None;
    }

    let numeric = |t: &str| t.chars().all(|c| c.is_ascii_digit());
    match tokens.iter().position(|&t| !numeric(t)) {
        None => {
            let (a, b, c) = (tokens[0], tokens[1], tokens[2]);
            if c.len() >= 3 && a.len() <= 2 {
                ymd(c, b, a)
            } else {
                ymd(a, b, c)
            }
        }
        Some(1) => {
            let month = month_from_name(tokens[1])?;
            if tokens[0].len() >= 3 {
                from_parts(tokens[0], month, tokens[2])
            } else {
                from_parts(tokens[2], month, tokens[0])
            }
        }
        Some(0) => {
            let month = month_from_name(tokens[0])?;
            from_parts(tokens[2], month, tokens[1])
        }
        Some(_) => None,
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    from_parts(year, month.parse().ok()?, day)
}

fn from_parts(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    if year.len() > 4 {
        return None;
    }
    let year = parse_year(year)?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// "1er" -> "1", "3rd" -> "3"
fn strip_ordinal(token: &str) -> &str {
    ["er", "st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| {
            token
                .strip_suffix(*suffix)
                .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or(token)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() <= 2 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            Some(2000 + year)
        } else {
            Some(1900 + year)
        }
    } else {
        Some(year)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" | "janvier" | "janv" => 1,
        "february" | "feb" | "fevrier" | "février" | "fev" | "fevr" | "févr" => 2,
        "march" | "mar" | "mars" => 3,
        "april" | "apr" | "avril" | "avr" => 4,
        "may" | "mai" => 5,
        "june" | "jun" | "juin" => 6,
        "july" | "jul" | "juillet" | "juil" => 7,
        "august" | "aug" | "aout" | "août" => 8,
        "september" | "sep" | "sept" | "septembre" => 9,
        "october" | "oct" | "octobre" => 10,
        "november" | "nov" | "novembre" => 11,
        "december" | "dec" | "decembre" | "décembre" | "déc" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_iso_forms() {
        assert_eq!(parse_date("2021-06-04"), date(2021, 6, 4));
        assert_eq!(parse_date("2021-6-4"), date(2021, 6, 4));
        assert_eq!(parse_date("2021-06-04T00:00:00"), date(2021, 6, 4));
        assert_eq!(parse_date("2021-06-04 13:45"), date(2021, 6, 4));
        assert_eq!(parse_date("20210604"), date(2021, 6, 4));
        assert_eq!(parse_date("2021/06/04"), date(2021, 6, 4));
    }

    #[test]
    fn test_day_first_forms() {
        assert_eq!(parse_date("04.06.2021"), date(2021, 6, 4));
        assert_eq!(parse_date("04/06/2021"), date(2021, 6, 4));
    }

    #[test]
    fn test_two_digit_year_is_year_first() {
        assert_eq!(parse_date("21-06-04"), date(2021, 6, 4));
        assert_eq!(parse_date("99-12-31"), date(1999, 12, 31));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_date("4 June 2021"), date(2021, 6, 4));
        assert_eq!(parse_date("1er février 2020"), date(2020, 2, 1));
        assert_eq!(parse_date("15 aout 2019"), date(2019, 8, 15));
        assert_eq!(parse_date("2022-déc.-31"), date(2022, 12, 31));
        assert_eq!(parse_date("March 3rd, 2018"), date(2018, 3, 3));
    }

    #[test]
    fn test_decomposed_accents() {
        assert_eq!(parse_date("3 de\u{0301}cembre 2020"), date(2020, 12, 3));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-13-01"), None);
        assert_eq!(parse_date("31.02.2021"), None);
        assert_eq!(parse_date("4 Foo 2021"), None);
        assert_eq!(parse_date("not a date"), None);
    }
}
