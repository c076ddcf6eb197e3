//! End-to-end scenarios over the public surface (mirrors the literal
//! scenarios worked through during design: preserved short prose,
//! deterministic summary, code split, exact/fuzzy dedup, budget search,
//! and partial-write detection).

use uc_core::{compress, uncompress, CompressOptions, ExpandOptions, Message, VerbatimMap};

fn msg(id: &str, index: u64, role: &str, content: &str) -> Message {
    let mut m = Message::new(id, index);
    m.role = Some(role.to_string());
    m.content = Some(content.to_string());
    m
}

#[test]
fn preserved_short_prose() {
    let messages = vec![msg("1", 0, "user", "What is 2+2?")];
    let result = compress(&messages, &CompressOptions::default()).unwrap();
    assert_eq!(result.messages, messages);
    assert_eq!(result.stats.messages_compressed, 0);
    assert_eq!(result.stats.messages_preserved, 1);
    assert_eq!(result.stats.ratio, 1.0);
    assert_eq!(result.stats.token_ratio, 1.0);
    assert!(result.verbatim.is_empty());
}

#[test]
fn code_split_preserves_fenced_block_verbatim() {
    let prose = "This explanation covers quite a lot of background detail about the system design overall. "
        .repeat(15);
    let code = "```rust\nfn compute() -> u32 {\n    42\n}\n```";
    let content = format!("{prose}{code}");
    let messages = vec![msg("1", 0, "assistant", &content)];
    let options = CompressOptions {
        recency_window: 0,
        ..CompressOptions::default()
    };
    let result = compress(&messages, &options).unwrap();
    let out_content = result.messages[0].content.as_deref().unwrap();
    assert!(out_content.starts_with("[summary:"));
    assert!(out_content.contains("```rust\nfn compute() -> u32 {\n    42\n}\n```"));

    let expanded = uncompress(&result.messages, &result.verbatim, &ExpandOptions::default());
    assert_eq!(expanded.messages, messages);
}

#[test]
fn exact_dedup_round_trips_both_copies() {
    let long = "z".repeat(500);
    let messages = vec![
        msg("A", 0, "user", &long),
        msg("B", 1, "assistant", "ok"),
        msg("A2", 2, "user", &long),
    ];
    let options = CompressOptions {
        recency_window: 0,
        ..CompressOptions::default()
    };
    let result = compress(&messages, &options).unwrap();
    assert_eq!(result.stats.messages_deduped, Some(1));
    let expanded = uncompress(&result.messages, &result.verbatim, &ExpandOptions::default());
    assert_eq!(expanded.messages, messages);
}

#[test]
fn fuzzy_dedup_flags_near_identical_messages() {
    let base = (0..40)
        .map(|n| format!("processing step {n} of the pipeline ran to completion"))
        .collect::<Vec<_>>()
        .join("\n");
    let variant = base.replace("processing step 7", "processing phase 7");
    let messages = vec![
        msg("1", 0, "assistant", &base),
        msg("2", 1, "assistant", &variant),
    ];
    let options = CompressOptions {
        recency_window: 0,
        dedup: true,
        fuzzy_dedup: true,
        fuzzy_threshold: 0.85,
        ..CompressOptions::default()
    };
    let result = compress(&messages, &options).unwrap();
    assert_eq!(result.stats.messages_fuzzy_deduped, Some(1));
    let tag = result.messages[0].content.as_deref().unwrap();
    assert!(tag.starts_with("[uc:near-dup"));
}

#[test]
fn budget_search_fits_and_respects_min_recency_window() {
    let messages: Vec<Message> = (0..50)
        .map(|i| {
            let sentence = format!(
                "Message number {i} contains a reasonably long sentence about system behavior that takes up real space in the token budget overall today. "
            );
            let content = sentence.repeat(5);
            msg(&i.to_string(), i as u64, "user", &content)
        })
        .collect();
    let options = CompressOptions {
        token_budget: Some(2000),
        min_recency_window: 2,
        recency_window: 4,
        ..CompressOptions::default()
    };
    let result = compress(&messages, &options).unwrap();
    assert_eq!(result.fits, Some(true));
    assert!(result.token_count.unwrap() <= 2000);
    assert!(result.recency_window.unwrap() >= 2);
}

#[test]
fn partial_write_detection_reports_missing_ids() {
    let filler = "Background detail that is not especially interesting on its own merits. ".repeat(20);
    let messages = vec![msg("1", 0, "assistant", &filler)];
    let options = CompressOptions {
        recency_window: 0,
        ..CompressOptions::default()
    };
    let result = compress(&messages, &options).unwrap();
    let empty = VerbatimMap::new();
    let expanded = uncompress(&result.messages, &empty, &ExpandOptions::default());
    assert_eq!(expanded.missing_ids, vec!["1".to_string()]);
    assert_eq!(expanded.messages, result.messages);
    assert_eq!(expanded.messages_expanded, 0);
}
