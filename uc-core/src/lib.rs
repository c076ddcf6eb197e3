//! Context compression engine: classification, deterministic
//! summarization, code/prose splitting, exact and fuzzy deduplication,
//! token-budget recency search, provenance metadata, and round-trip
//! expansion over an optional searchable verbatim store.
//!
//! The synchronous path (`compress`, `uncompress`, `search`) performs no
//! I/O and no suspension; the async path (`compress_with_summarizer`)
//! suspends only at the two points a caller-provided `Summarizer`
//! capability can legitimately run: the summarization call itself, and
//! (when a token budget is requested) its repetition during recency-window
//! search.

pub mod classify;
pub mod compress;
pub mod config;
pub mod dedup;
pub mod entities;
pub mod error;
pub mod expand;
pub mod hash;
pub mod split;
pub mod summarize;
pub mod tokenize;
pub mod types;

pub use classify::classify;
pub use compress::{compress, compress_with_summarizer};
pub use error::{Result, UcError};
pub use expand::{search, uncompress, CallbackStore, VerbatimStore};
pub use summarize::{create_escalating_summarizer, create_summarizer, LlmCall, Summarizer, SummarizerOptions};
pub use tokenize::{estimate_tokens, estimate_tokens_total};
pub use types::{
    ClassifyResult, CompressOptions, CompressResult, CompressionStats, DedupAnnotation,
    ExpandOptions, ExpandResult, Message, SearchResult, Tier, UcOriginal, VerbatimMap,
};
