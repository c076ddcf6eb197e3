//! Entity extraction: pulls identifiers worth preserving in a summary's
//! entity suffix.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

const MAX_ENTITIES: usize = 10;

/// Words that commonly open a sentence; a leading capitalized word from
/// this set does not, by itself, make a capitalized phrase a proper noun.
const COMMON_STARTERS: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "It", "He", "She", "They", "We", "You",
    "I", "There", "Here", "In", "On", "At", "For", "With", "And", "But", "Or", "So", "If",
    "When", "While", "Although", "Because", "Since", "As", "To", "Of", "By", "From", "Is", "Are",
    "Was", "Were", "Be", "Been", "Being", "Has", "Have", "Had", "Do", "Does", "Did", "Can",
    "Could", "Will", "Would", "Should", "Shall", "May", "Might", "Must", "Not", "No", "Yes",
    "Well", "Now", "Then", "Also", "However", "Therefore", "Thus", "Hence", "Moreover",
    "Furthermore", "Additionally", "Meanwhile", "Finally", "First", "Second", "Third", "Next",
    "Last", "Please", "Let", "Just", "Only", "Even", "Still", "Again", "Once", "After", "Before",
    "Until", "Unless", "Though", "Yet", "Perhaps", "Maybe", "Indeed", "Certainly", "Clearly",
    "Obviously", "Basically", "Actually", "Generally", "Usually", "Sometimes", "Often", "Rarely",
    "Always", "Never", "Today", "Yesterday", "Tomorrow", "OK", "Okay", "Great", "Sure", "Thanks",
];

static PROPER_NOUN_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z]*(?:\s+[A-Z][a-zA-Z]*)*\b").unwrap());
static PASCAL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]+)+\b").unwrap());
static CAMEL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-z0-9]+(?:[A-Z][a-z0-9]+)+\b").unwrap());
static SNAKE_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b").unwrap());
static VOWELLESS_ABBREV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[bcdfghjklmnpqrstvwxz]{3,}\b").unwrap());
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:ms|s|mb|gb|kb|%|retries|workers|attempts|requests|reqs|px|em)\b")
        .unwrap()
});

fn first_word(phrase: &str) -> &str {
    phrase.split_whitespace().next().unwrap_or(phrase)
}

/// Extract up to 10 distinct entities from `text`, in first-seen order.
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entities: Vec<String> = Vec::new();

    let mut push = |value: String, seen: &mut HashSet<String>, entities: &mut Vec<String>| {
        if entities.len() >= MAX_ENTITIES {
            return;
        }
        if seen.insert(value.clone()) {
            entities.push(value);
        }
    };

    for m in PROPER_NOUN_PHRASE.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        let phrase = m.as_str();
        if COMMON_STARTERS.contains(&first_word(phrase)) {
            continue;
        }
        push(phrase.to_string(), &mut seen, &mut entities);
    }
    for m in PASCAL_CASE.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        push(m.as_str().to_string(), &mut seen, &mut entities);
    }
    for m in CAMEL_CASE.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        push(m.as_str().to_string(), &mut seen, &mut entities);
    }
    for m in SNAKE_CASE.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        push(m.as_str().to_string(), &mut seen, &mut entities);
    }
    for m in VOWELLESS_ABBREV.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        push(m.as_str().to_string(), &mut seen, &mut entities);
    }
    for m in NUMBER_WITH_UNIT.find_iter(text) {
        if entities.len() >= MAX_ENTITIES {
            break;
        }
        push(m.as_str().to_string(), &mut seen, &mut entities);
    }

    entities
}

/// Render the `" | entities: a, b, c"` suffix, or empty string if none.
pub fn entity_suffix(text: &str) -> String {
    let entities = extract_entities(text);
    if entities.is_empty() {
        String::new()
    } else {
        format!(" | entities: {}", entities.join(", "))
    }
}
