use serde_json::json;

use super::*;
use crate::decode::decode;

fn group(slide: u32, contents: &[&str]) -> SlideSuggestionGroup {
    SlideSuggestionGroup {
        slide,
        suggestions: contents
            .iter()
            .map(|content| Suggestion {
                content: (*content).to_string(),
                link: String::new(),
            })
            .collect(),
    }
}

#[test]
fn returns_exactly_the_matching_groups_for_every_slide() {
    let all = vec![
        group(2, &["a"]),
        group(1, &["b"]),
        group(2, &["c"]),
        group(4, &["d"]),
    ];
    let max = all.iter().map(|g| g.slide).max().unwrap_or(0);

    for slide in 1..=max + 1 {
        let expected: Vec<&SlideSuggestionGroup> =
            all.iter().filter(|g| g.slide == slide).collect();
        assert_eq!(suggestions_for(slide, &all), expected, "slide {slide}");
    }
    assert!(suggestions_for(3, &all).is_empty());
    assert!(suggestions_for(5, &all).is_empty());
}

#[test]
fn empty_input_has_no_suggestions() {
    assert!(suggestions_for(1, &[]).is_empty());
    assert!(suggestions_for_untyped(1, &[]).is_empty());
}

#[test]
fn decoded_order_survives_alignment() {
    let raw = json!({
        "suggestion": [ { "suggestions": [ { "content": [
            { "slide": 3, "suggestions": [ { "content": "first", "link": "" } ] },
            { "slide": 1, "suggestions": [ { "content": "other", "link": "" } ] },
            { "slide": 3, "suggestions": [ { "content": "second", "link": "" } ] }
        ] } ] } ]
    });
    let all = decode(&raw).expect("decode");
    let matched = suggestions_for(3, &all);

    assert_eq!(matched.len(), 2);
    assert_eq!(matched[0].suggestions[0].content, "first");
    assert_eq!(matched[1].suggestions[0].content, "second");
}

#[test]
fn untyped_alignment_skips_entries_without_suggestions() {
    let all = vec![
        json!({ "slide": 2, "suggestions": [ { "content": "keep", "link": "https://x" } ] }),
        json!({ "slide": 2 }),
    ];
    let matched = suggestions_for_untyped(2, &all);

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].suggestions[0].content, "keep");
}

#[test]
fn untyped_alignment_tolerates_garbage_entries() {
    let all = vec![
        json!(null),
        json!("slide 1"),
        json!({ "slide": "1", "suggestions": [] }),
        json!({ "slide": 1, "suggestions": "none" }),
        json!({ "slide": 1.0, "suggestions": [ { "content": "kept" , "link": "" }, { "content": 5 } ] }),
    ];
    let matched = suggestions_for_untyped(1, &all);

    assert_eq!(matched, vec![group(1, &["kept"])]);
}

#[test]
fn lists_distinct_slides_in_ascending_order() {
    let all = vec![group(3, &[]), group(1, &[]), group(3, &[])];
    assert_eq!(slides_with_suggestions(&all), vec![1, 3]);
}
