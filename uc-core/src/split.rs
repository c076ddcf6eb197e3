//! Code/prose splitter.
//!
//! Matches fenced code blocks and produces alternating prose/code segments
//! in order. Empty (whitespace-only) prose segments are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?sm)^\x20{0,3}```.*?\n.*?\n\s*```").unwrap());

/// One segment of a split text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Prose(String),
    Code(String),
}

impl Segment {
    pub fn content(&self) -> &str {
        match self {
            Segment::Prose(s) | Segment::Code(s) => s,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code(_))
    }
}

/// Split `text` into alternating prose and fenced-code segments.
pub fn split_code_and_prose(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;

    for m in FENCE.find_iter(text) {
        if m.start() > cursor {
            let prose = &text[cursor..m.start()];
            if !prose.trim().is_empty() {
                segments.push(Segment::Prose(prose.to_string()));
            }
        }
        segments.push(Segment::Code(m.as_str().to_string()));
        cursor = m.end();
    }
    if cursor < text.len() {
        let prose = &text[cursor..];
        if !prose.trim().is_empty() {
            segments.push(Segment::Prose(prose.to_string()));
        }
    }
    segments
}

/// Total character count of prose segments only.
pub fn prose_char_count(text: &str) -> usize {
    split_code_and_prose(text)
        .iter()
        .filter(|s| !s.is_code())
        .map(|s| s.content().chars().count())
        .sum()
}

/// True iff `text` contains at least one fenced code block.
pub fn has_code_fence(text: &str) -> bool {
    FENCE.is_match(text)
}
