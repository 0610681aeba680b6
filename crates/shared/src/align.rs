use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use crate::{
    decode::slide_number,
    domain::{SlideSuggestionGroup, Suggestion},
};

pub fn suggestions_for(slide: u32, all: &[SlideSuggestionGroup]) -> Vec<&SlideSuggestionGroup> {
    all.iter().filter(|group| group.slide == slide).collect()
}

/// Lenient variant for suggestion lists that never went through
/// [`crate::decode::decode`].
///
/// Entries without a valid `slide` (the decoder's rule) or an array
/// `suggestions` are skipped, as are inner entries that are not
/// `{content, link}` string pairs. Nothing here fails; skipped entries are
/// only reported through tracing.
pub fn suggestions_for_untyped(slide: u32, all: &[Value]) -> Vec<SlideSuggestionGroup> {
    let mut skipped_groups = 0usize;
    let mut skipped_suggestions = 0usize;
    let mut matched = Vec::new();

    for entry in all {
        let Some((entry_slide, entries)) = lenient_group(entry) else {
            skipped_groups += 1;
            continue;
        };
        if entry_slide != slide {
            continue;
        }

        let suggestions: Vec<Suggestion> = entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect();
        skipped_suggestions += entries.len() - suggestions.len();
        matched.push(SlideSuggestionGroup { slide, suggestions });
    }

    if skipped_groups > 0 || skipped_suggestions > 0 {
        warn!(
            slide,
            skipped_groups, skipped_suggestions, "ignored malformed suggestion entries"
        );
    }

    matched
}

fn lenient_group(entry: &Value) -> Option<(u32, &Vec<Value>)> {
    let slide = match entry.get("slide")? {
        Value::Number(number) => slide_number(number)?,
        _ => return None,
    };
    let suggestions = entry.get("suggestions")?.as_array()?;
    Some((slide, suggestions))
}

pub fn slides_with_suggestions(all: &[SlideSuggestionGroup]) -> Vec<u32> {
    all.iter()
        .map(|group| group.slide)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[path = "tests/align_tests.rs"]
mod tests;
