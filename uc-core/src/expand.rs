//! Expander / searcher: restores originals from a verbatim store, and
//! regex-searches the verbatim store with provenance linkage back to
//! summary IDs.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Result;
use crate::types::{ExpandOptions, ExpandResult, Message, SearchResult, VerbatimMap};

/// Abstraction over however the caller chose to persist the verbatim map:
/// a plain mapping, or a lookup callback. Both have identical semantics.
pub trait VerbatimStore {
    fn get(&self, id: &str) -> Option<Message>;
}

impl VerbatimStore for VerbatimMap {
    fn get(&self, id: &str) -> Option<Message> {
        HashMap::get(self, id).cloned()
    }
}

/// A store backed by a user-provided lookup function.
pub struct CallbackStore<F>(pub F)
where
    F: Fn(&str) -> Option<Message>;

impl<F> VerbatimStore for CallbackStore<F>
where
    F: Fn(&str) -> Option<Message>,
{
    fn get(&self, id: &str) -> Option<Message> {
        (self.0)(id)
    }
}

/// One pass of expansion: replace every compressed message with its
/// sources where available, tracking which IDs were missing.
fn expand_once(messages: &[Message], store: &dyn VerbatimStore) -> (Vec<Message>, usize, Vec<String>) {
    let mut out = Vec::new();
    let mut expanded = 0usize;
    let mut missing = Vec::new();

    for message in messages {
        let Some(provenance) = message.provenance() else {
            out.push(message.clone());
            continue;
        };
        if provenance.ids.is_empty() {
            out.push(message.clone());
            continue;
        }

        let mut found: Vec<Message> = Vec::new();
        let mut missing_for_message: Vec<String> = Vec::new();
        for id in &provenance.ids {
            match store.get(id) {
                Some(original) => found.push(original),
                None => missing_for_message.push(id.clone()),
            }
        }

        if found.is_empty() {
            // All sources missing: pass the summary through unchanged.
            out.push(message.clone());
            missing.extend(missing_for_message);
            continue;
        }

        out.extend(found);
        expanded += 1;
        missing.extend(missing_for_message);
    }

    (out, expanded, missing)
}

/// Restore compressed messages to their originals via `store`. When
/// `options.recursive` is set, repeats expansion until no emitted message
/// still carries provenance and the previous pass expanded something.
pub fn uncompress(messages: &[Message], store: &dyn VerbatimStore, options: &ExpandOptions) -> ExpandResult {
    let mut current = messages.to_vec();
    let mut total_expanded = 0usize;
    let mut total_missing: Vec<String> = Vec::new();

    loop {
        let (next, expanded, missing) = expand_once(&current, store);
        total_expanded += expanded;
        total_missing.extend(missing);
        let still_has_provenance = next.iter().any(|m| m.provenance().is_some());
        current = next;

        if !options.recursive || expanded == 0 || !still_has_provenance {
            break;
        }
    }

    let passthrough = current.len().saturating_sub(
        current
            .iter()
            .filter(|m| m.provenance().is_some())
            .count(),
    );

    ExpandResult {
        messages: current,
        messages_expanded: total_expanded,
        messages_passthrough: passthrough,
        missing_ids: total_missing,
    }
}

/// Regex/literal-search the verbatim store, linking each match back to
/// its summary via the inverse `message_id -> summary_id` map built from
/// every compressed message carrying provenance.
pub fn search(compressed: &[Message], verbatim: &VerbatimMap, pattern: &str) -> Result<Vec<SearchResult>> {
    let regex = Regex::new(pattern)?;

    let mut inverse_owned: HashMap<String, String> = HashMap::new();
    for message in compressed {
        if let Some(provenance) = message.provenance() {
            for id in &provenance.ids {
                inverse_owned.insert(id.clone(), provenance.summary_id.clone());
            }
        }
    }

    let mut results = Vec::new();
    for (id, message) in verbatim.iter() {
        let Some(content) = message.content.as_deref() else {
            continue;
        };
        let mut matches = Vec::new();
        let mut pos = 0usize;
        while pos <= content.len() {
            match regex.find_at(content, pos) {
                Some(m) => {
                    matches.push(m.as_str().to_string());
                    pos = if m.end() > m.start() { m.end() } else { m.end() + 1 };
                }
                None => break,
            }
        }
        if matches.is_empty() {
            continue;
        }
        let summary_id = inverse_owned.get(id).cloned().unwrap_or_else(|| id.clone());
        results.push(SearchResult {
            summary_id,
            message_id: id.clone(),
            content: content.to_string(),
            matches,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;
    use crate::types::CompressOptions;

    fn msg(id: &str, index: u64, role: &str, content: &str) -> Message {
        let mut m = Message::new(id, index);
        m.role = Some(role.to_string());
        m.content = Some(content.to_string());
        m
    }

    #[test]
    fn round_trip_restores_compressed_message() {
        let filler = "Mundane unrelated sentence number here. ".repeat(40);
        let messages = vec![msg("1", 0, "assistant", &filler)];
        let options = CompressOptions {
            recency_window: 0,
            ..CompressOptions::default()
        };
        let result = compress(&messages, &options).unwrap();
        let expanded = uncompress(&result.messages, &result.verbatim, &ExpandOptions::default());
        assert_eq!(expanded.messages, messages);
        assert!(expanded.missing_ids.is_empty());
    }

    #[test]
    fn s7_missing_store_entries_are_reported_and_passthrough() {
        let filler = "Mundane unrelated sentence number here. ".repeat(40);
        let messages = vec![msg("1", 0, "assistant", &filler)];
        let options = CompressOptions {
            recency_window: 0,
            ..CompressOptions::default()
        };
        let result = compress(&messages, &options).unwrap();
        let empty_store: VerbatimMap = VerbatimMap::new();
        let expanded = uncompress(&result.messages, &empty_store, &ExpandOptions::default());
        assert_eq!(expanded.missing_ids, vec!["1".to_string()]);
        assert_eq!(expanded.messages_expanded, 0);
        assert_eq!(expanded.messages, result.messages);
    }

    #[test]
    fn search_finds_matches_in_verbatim_store() {
        let mut verbatim = VerbatimMap::new();
        verbatim.insert("1".to_string(), msg("1", 0, "user", "the quick brown fox"));
        let compressed = Vec::new();
        let results = search(&compressed, &verbatim, "quick").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message_id, "1");
        assert_eq!(results[0].matches, vec!["quick".to_string()]);
    }
}
