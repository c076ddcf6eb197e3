//! Defaults and validation for the knobs `CompressOptions` exposes.
//!
//! A much smaller analogue of a full application config layer: still
//! serde+toml round-trippable with a `Default` impl and a `validate`
//! pass, but scoped only to what the compression engine itself reads.
//! Directory bootstrapping, hot-reload, and profiles belong to whatever
//! external daemon embeds this engine, not to the engine itself.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UcError};
use crate::types::CompressOptions;

/// Serializable defaults for `CompressOptions`, suitable for a
/// `compress.toml` shipped alongside a caller's configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressorDefaults {
    pub preserve: Vec<String>,
    pub recency_window: usize,
    pub dedup: bool,
    pub fuzzy_dedup: bool,
    pub fuzzy_threshold: f64,
    pub token_budget: Option<u32>,
    pub min_recency_window: usize,
}

impl Default for CompressorDefaults {
    fn default() -> Self {
        let opts = CompressOptions::default();
        Self {
            preserve: opts.preserve,
            recency_window: opts.recency_window,
            dedup: opts.dedup,
            fuzzy_dedup: opts.fuzzy_dedup,
            fuzzy_threshold: opts.fuzzy_threshold,
            token_budget: opts.token_budget,
            min_recency_window: opts.min_recency_window,
        }
    }
}

impl CompressorDefaults {
    /// Parse a `CompressorDefaults` from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| UcError::config(e.to_string()))
    }

    /// Serialize back to TOML text.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| UcError::config(e.to_string()))
    }

    /// Reject nonsensical configurations before they reach `compress`.
    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_threshold < 0.0 || self.fuzzy_threshold > 1.0 {
            return Err(UcError::config(format!(
                "fuzzy_threshold must be in [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.min_recency_window > self.recency_window && self.token_budget.is_none() {
            return Err(UcError::config(
                "min_recency_window must not exceed recency_window unless a token_budget search is requested".to_string(),
            ));
        }
        if let Some(budget) = self.token_budget {
            if budget == 0 {
                return Err(UcError::config("token_budget must be positive".to_string()));
            }
        }
        Ok(())
    }

    /// Build a `CompressOptions` from these defaults plus a source version.
    pub fn to_options(&self, source_version: i64) -> CompressOptions {
        CompressOptions {
            preserve: self.preserve.clone(),
            recency_window: self.recency_window,
            source_version,
            token_budget: self.token_budget,
            min_recency_window: self.min_recency_window,
            dedup: self.dedup,
            fuzzy_dedup: self.fuzzy_dedup,
            fuzzy_threshold: self.fuzzy_threshold,
            mode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compress_options_default() {
        let defaults = CompressorDefaults::default();
        assert_eq!(defaults.preserve, vec!["system".to_string()]);
        assert_eq!(defaults.recency_window, 4);
        assert!(defaults.dedup);
        assert!(!defaults.fuzzy_dedup);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn round_trips_through_toml() {
        let defaults = CompressorDefaults::default();
        let text = defaults.to_toml().unwrap();
        let parsed = CompressorDefaults::from_toml(&text).unwrap();
        assert_eq!(defaults, parsed);
    }

    #[test]
    fn rejects_out_of_range_fuzzy_threshold() {
        let mut defaults = CompressorDefaults::default();
        defaults.fuzzy_threshold = 1.5;
        assert!(defaults.validate().is_err());
    }
}
