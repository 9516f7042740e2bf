//! Pattern and template primitives used to decode statement fields.

pub mod amounts;
pub mod dates;
pub mod pattern;
pub mod template;

pub use amounts::{clean_group, parse_amount};
pub use dates::parse_date;
pub use pattern::{captured_groups, Pattern, RawPattern};
pub use template::Template;

/// Fold the non-breaking space variants PDF text extractors emit into
/// plain spaces, so patterns written with ` ` or `\s` keep matching.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00a0}' | '\u{2007}' | '\u{202f}' => ' ',
            c => c,
        })
        .collect()
}
