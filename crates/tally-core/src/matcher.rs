//! Descriptor matching against document text.

use tracing::trace;

use crate::models::descriptor::{Descriptor, MandatoryField};

/// Every descriptor whose declared mandatory patterns all match `text`.
///
/// Empty text yields no matches without evaluating any pattern.
pub fn find_matches<'d, I>(text: &str, descriptors: I) -> Vec<&'d Descriptor>
where
    I: IntoIterator<Item = &'d Descriptor>,
{
    if text.is_empty() {
        return Vec::new();
    }
    descriptors
        .into_iter()
        .filter(|d| is_candidate(text, d))
        .collect()
}

/// True when no declared mandatory pattern of `descriptor` fails on `text`.
pub fn is_candidate(text: &str, descriptor: &Descriptor) -> bool {
    descriptor
        .mandatory_patterns()
        .all(|(_, pattern)| pattern.is_match(text))
}

/// Mandatory patterns of `descriptor` that do not match `text`.
pub fn unmatched_patterns(text: &str, descriptor: &Descriptor) -> Vec<MandatoryField> {
    let unmatched: Vec<_> = descriptor
        .mandatory_patterns()
        .filter(|(_, pattern)| !pattern.is_match(text))
        .map(|(field, _)| field)
        .collect();
    if !unmatched.is_empty() {
        trace!(
            "Descriptor {} does not match: {:?}",
            descriptor.qualified_name(),
            unmatched
        );
    }
    unmatched
}
