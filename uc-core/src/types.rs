//! Core data model: messages, provenance, and the shapes every operation
//! reads and returns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The reserved metadata key the engine uses to carry provenance.
pub const PROVENANCE_KEY: &str = "_uc_original";

/// A single conversational turn.
///
/// Carries a typed core (the fields the engine reads) plus an open-ended
/// attribute bag for whatever else a producer attached; the engine never
/// inspects `extra`, it only round-trips it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Construct a minimal message with no content, role, or metadata.
    pub fn new(id: impl Into<String>, index: u64) -> Self {
        Self {
            id: id.into(),
            index,
            role: None,
            content: None,
            metadata: Map::new(),
            tool_calls: None,
            extra: Map::new(),
        }
    }

    /// True iff `tool_calls` is present and non-empty.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Content length in characters, 0 if absent.
    pub fn content_len(&self) -> usize {
        self.content.as_deref().map_or(0, |s| s.chars().count())
    }

    /// Read back this message's `_uc_original` provenance, if present.
    pub fn provenance(&self) -> Option<UcOriginal> {
        self.metadata
            .get(PROVENANCE_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Attach provenance, overwriting any existing `_uc_original` entry.
    pub fn set_provenance(&mut self, provenance: &UcOriginal) {
        let value = serde_json::to_value(provenance).expect("UcOriginal always serializes");
        self.metadata.insert(PROVENANCE_KEY.to_string(), value);
    }

    /// True iff `content` begins with the reserved summary prefix.
    pub fn is_already_summary(&self) -> bool {
        self.content
            .as_deref()
            .is_some_and(|c| c.starts_with("[summary:"))
    }
}

/// Provenance carried by every compressed message's `metadata._uc_original`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UcOriginal {
    /// Non-empty ordered sequence of original message IDs this summary replaces.
    pub ids: Vec<String>,
    /// Deterministic `uc_sum_<base36>` label, derived from sorted `ids`.
    pub summary_id: String,
    /// Present iff any source message was itself previously compressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<Vec<String>>,
    /// Mirrors `CompressOptions::source_version`.
    pub version: i64,
}

/// Side store mapping an original message ID to its full `Message`.
pub type VerbatimMap = HashMap<String, Message>;

/// Classifier decision tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// Structured content: preserve verbatim.
    T0,
    /// Short prose (<20 words).
    T2,
    /// Long prose: compressible.
    T3,
}

/// Result of classifying a raw content string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResult {
    pub decision: Tier,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

impl ClassifyResult {
    /// True iff any of `reasons` is a HARD T0 reason (drives preservation).
    pub fn has_hard_reason(&self) -> bool {
        self.reasons.iter().any(|r| crate::classify::is_hard_reason(r))
    }
}

/// Per-message dedup annotation, attached internally before emission.
#[derive(Debug, Clone)]
pub struct DedupAnnotation {
    /// Index (into the input slice) of the kept message.
    pub duplicate_of_index: usize,
    /// Character length of the kept message's content.
    pub content_length: usize,
    /// Present for fuzzy matches only; similarity in `[0, 1]`.
    pub similarity: Option<f64>,
}

/// Options controlling `compress`.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Roles that are always preserved verbatim. Default `["system"]`.
    pub preserve: Vec<String>,
    /// Tail length (in indices) never compressed. Default 4.
    pub recency_window: usize,
    /// Mirrored into every emitted `_uc_original.version`. Default 0.
    pub source_version: i64,
    /// When set, `compress` binary-searches `recency_window` to fit.
    pub token_budget: Option<u32>,
    /// Lower bound for the budget-search binary search. Default 0.
    pub min_recency_window: usize,
    /// Enable exact dedup. Default true.
    pub dedup: bool,
    /// Enable fuzzy (near-duplicate) dedup. Default false.
    pub fuzzy_dedup: bool,
    /// Jaccard similarity threshold for fuzzy dedup. Default 0.85.
    pub fuzzy_threshold: f64,
    /// Reserved; only `None`/`"lossy"` are recognized. `"lossy"` errors.
    pub mode: Option<String>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            preserve: vec!["system".to_string()],
            recency_window: 4,
            source_version: 0,
            token_budget: None,
            min_recency_window: 0,
            dedup: true,
            fuzzy_dedup: false,
            fuzzy_threshold: 0.85,
            mode: None,
        }
    }
}

/// Result of `compress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressResult {
    pub messages: Vec<Message>,
    #[serde(skip)]
    pub verbatim: VerbatimMap,
    pub stats: CompressionStats,
    /// Present only when `token_budget` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency_window: Option<usize>,
}

/// Aggregate statistics for one `compress` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_version: i64,
    pub ratio: f64,
    pub token_ratio: f64,
    pub messages_compressed: usize,
    pub messages_preserved: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages_deduped: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages_fuzzy_deduped: Option<usize>,
}

/// Options controlling `uncompress`.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Repeat expansion until no emitted message still carries provenance.
    pub recursive: bool,
}

/// Result of `uncompress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandResult {
    pub messages: Vec<Message>,
    pub messages_expanded: usize,
    pub messages_passthrough: usize,
    pub missing_ids: Vec<String>,
}

/// One match of `search` against the verbatim store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub summary_id: String,
    pub message_id: String,
    pub content: String,
    pub matches: Vec<String>,
}
