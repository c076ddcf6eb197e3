//! Content classifier: decides per-message preservation tier.
//!
//! Two independent detector families (structural, content-type) union
//! their reasons; any reason firing forces tier T0. Absent any reason,
//! the tier falls back to word-count-based prose tiering (T2/T3).
//!
//! Patterns are precompiled once via `once_cell::sync::Lazy` and treated
//! as a versioned stable surface: changing one may shift classification
//! tiers and should be covered by stress tests.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ClassifyResult, Tier};

/// HARD T0 reasons drive preservation in the orchestrator outright. All
/// other T0 reasons are "soft": the orchestrator may still compress while
/// keeping the referenced token in the entity suffix.
const HARD_T0_REASONS: &[&str] = &[
    "code_fence",
    "indented_code",
    "json_structure",
    "yaml_structure",
    "high_special_char_ratio",
    "high_line_length_variance",
    "api_key",
    "latex_math",
    "unicode_math",
    "sql_content",
    "verse_pattern",
];

pub fn is_hard_reason(reason: &str) -> bool {
    HARD_T0_REASONS.contains(&reason)
}

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?sm)^```[^\n]*\n.*?\n\s*```").unwrap());

static INDENTED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:\x20{4}|\t).*\n(?:\x20{4}|\t)").unwrap());

static LATEX_MATH_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$.+?\$\$").unwrap());
static LATEX_MATH_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$\n]+\$").unwrap());

const UNICODE_MATH_CHARS: &[char] = &[
    '∀', '∃', '∈', '∉', '⊆', '⊇', '∪', '∩', '∧', '∨', '¬', '→', '↔', '∑', '∏', '∫', '√', '∞', '≈',
    '≠', '≤', '≥', '±', '×', '÷',
];

static JSON_STRUCTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(\{"|\[\{|\[\[|\["|\[-?[0-9])"#).unwrap());

static YAML_STRUCTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[A-Za-z_][\w-]*:\s+\S.*\n[A-Za-z_][\w-]*:\s+\S.*$").unwrap());

static VERSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[A-Z][^.!?\n]*\n[A-Z][^.!?\n]*\n[A-Z][^.!?\n]*$").unwrap()
});

const SPECIAL_CHARS: &str = "{}[]<>|\\;:@#$%^&*()=+`~";

static SQL_STRONG: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bgroup\s+by\b",
        r"(?i)\bprimary\s+key\b",
        r"(?i)\breturning\b",
        r"(?i)\binner\s+join\b",
        r"(?i)\bleft\s+join\b",
        r"(?i)\bright\s+join\b",
        r"(?i)\bvarchar\b",
        r"(?i)\bforeign\s+key\b",
        r"(?i)\bcreate\s+table\b",
        r"(?i)\bdrop\s+table\b",
        r"(?i)\balter\s+table\b",
        r"(?i)\bnot\s+null\b",
        r"(?i)\bauto_increment\b",
        r"(?i)\border\s+by\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SQL_WEAK: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bwhere\b",
        r"(?i)\bjoin\b",
        r"(?i)\bhaving\b",
        r"(?i)\bvalues\b",
        r"(?i)\bselect\b",
        r"(?i)\bfrom\b",
        r"(?i)\binsert\b",
        r"(?i)\bupdate\b",
        r"(?i)\bdelete\b",
        r"(?i)\blimit\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static API_KEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bsk-[A-Za-z0-9]{20,}\b",
        r"\bAKIA[0-9A-Z]{16}\b",
        r"\bgh[pso]_[A-Za-z0-9]{36,}\b",
        r"\bgithub_pat_[A-Za-z0-9_]{22,}\b",
        r"\b(?:sk|rk)_(?:live|test)_[A-Za-z0-9]{10,}\b",
        r"\bxox[bpra]-[A-Za-z0-9-]{10,}\b",
        r"\bSG\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b",
        r"\bglpat-[A-Za-z0-9_-]{20,}\b",
        r"\bnpm_[A-Za-z0-9]{30,}\b",
        r"\bAIza[A-Za-z0-9_-]{30,}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static API_KEY_GENERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9]+[-_][A-Za-z0-9]{20,}\b").unwrap());

static BEM_REJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:[a-z]{2,}-){3,}").unwrap());

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap());
static VERSION_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bv?\d+\.\d+\.\d+\b").unwrap());
static HASH_OR_SHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9a-fA-F]{40,64}\b").unwrap());
static FILE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:/[\w.\-]+){2,}").unwrap());
static IP_OR_SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b|\b\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?\b").unwrap()
});
static QUOTED_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[\w.-]+"\s*:"#).unwrap());
static LEGAL_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:shall|may not|notwithstanding|whereas|hereby)\b").unwrap());
static DIRECT_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["“][^"”\n]{10,}["”]"#).unwrap());
static NUMERIC_WITH_UNITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:ms|s|mb|gb|kb|%|px|em|retries|workers|requests|reqs|attempts)\b")
        .unwrap()
});

fn coefficient_of_variation(lines: &[&str]) -> Option<f64> {
    if lines.len() <= 3 {
        return None;
    }
    let lens: Vec<f64> = lines.iter().map(|l| l.chars().count() as f64).collect();
    let n = lens.len() as f64;
    let mean = lens.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = lens.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

fn special_char_ratio(content: &str) -> f64 {
    let total = content.chars().count();
    if total == 0 {
        return 0.0;
    }
    let special = content
        .chars()
        .filter(|c| SPECIAL_CHARS.contains(*c))
        .count();
    special as f64 / total as f64
}

fn detect_sql(content: &str) -> bool {
    if SQL_STRONG.iter().any(|re| re.is_match(content)) {
        return true;
    }
    let mut distinct = 0usize;
    let mut has_weak = false;
    for re in SQL_STRONG.iter().chain(SQL_WEAK.iter()) {
        if re.is_match(content) {
            distinct += 1;
        }
    }
    for re in SQL_WEAK.iter() {
        if re.is_match(content) {
            has_weak = true;
            break;
        }
    }
    distinct >= 3 && has_weak
}

fn detect_api_key(content: &str) -> bool {
    if API_KEY_PATTERNS.iter().any(|re| re.is_match(content)) {
        return true;
    }
    API_KEY_GENERIC
        .find_iter(content)
        .any(|m| !BEM_REJECT.is_match(m.as_str()))
}

/// Classify raw content into a preservation tier, with the set of
/// detector reasons that fired.
pub fn classify(content: &str) -> ClassifyResult {
    let mut reasons: Vec<String> = Vec::new();
    let lines: Vec<&str> = content.lines().collect();

    if CODE_FENCE.is_match(content) {
        reasons.push("code_fence".to_string());
    }
    if INDENTED_CODE.is_match(content) {
        reasons.push("indented_code".to_string());
    }
    if LATEX_MATH_BLOCK.is_match(content) || LATEX_MATH_INLINE.is_match(content) {
        reasons.push("latex_math".to_string());
    }
    if content.chars().any(|c| UNICODE_MATH_CHARS.contains(&c)) {
        reasons.push("unicode_math".to_string());
    }
    if JSON_STRUCTURE.is_match(content) {
        reasons.push("json_structure".to_string());
    }
    if YAML_STRUCTURE.is_match(content) {
        reasons.push("yaml_structure".to_string());
    }
    if VERSE_PATTERN.is_match(content) {
        reasons.push("verse_pattern".to_string());
    }
    if let Some(cv) = coefficient_of_variation(&lines) {
        if cv > 1.2 {
            reasons.push("high_line_length_variance".to_string());
        }
    }
    if special_char_ratio(content) > 0.15 {
        reasons.push("high_special_char_ratio".to_string());
    }
    if detect_sql(content) {
        reasons.push("sql_content".to_string());
    }
    if detect_api_key(content) {
        reasons.push("api_key".to_string());
    }
    if URL.is_match(content) {
        reasons.push("url".to_string());
    }
    if EMAIL.is_match(content) {
        reasons.push("email".to_string());
    }
    if PHONE.is_match(content) {
        reasons.push("phone".to_string());
    }
    if VERSION_NUMBER.is_match(content) {
        reasons.push("version_number".to_string());
    }
    if HASH_OR_SHA.is_match(content) {
        reasons.push("hash_or_sha".to_string());
    }
    if FILE_PATH.is_match(content) {
        reasons.push("file_path".to_string());
    }
    if IP_OR_SEMVER.is_match(content) {
        reasons.push("ip_or_semver".to_string());
    }
    if QUOTED_KEY.is_match(content) {
        reasons.push("quoted_key".to_string());
    }
    if LEGAL_TERM.is_match(content) {
        reasons.push("legal_term".to_string());
    }
    if DIRECT_QUOTE.is_match(content) {
        reasons.push("direct_quote".to_string());
    }
    if NUMERIC_WITH_UNITS.is_match(content) {
        reasons.push("numeric_with_units".to_string());
    }

    if !reasons.is_empty() {
        let confidence = (0.7 + 0.05 * reasons.len() as f64).min(0.95);
        return ClassifyResult {
            decision: Tier::T0,
            confidence,
            reasons,
        };
    }

    let word_count = content.split_whitespace().count();
    let decision = if word_count < 20 { Tier::T2 } else { Tier::T3 };
    ClassifyResult {
        decision,
        confidence: 0.65,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_code_is_t0_hard() {
        let result = classify("prose\n```rust\nfn main() {}\n```\nmore prose");
        assert_eq!(result.decision, Tier::T0);
        assert!(result.reasons.contains(&"code_fence".to_string()));
    }

    #[test]
    fn json_object_is_t0() {
        let result = classify(r#"{"key": "value", "n": 1}"#);
        assert_eq!(result.decision, Tier::T0);
        assert!(result.reasons.contains(&"json_structure".to_string()));
    }

    #[test]
    fn short_prose_is_t2() {
        let result = classify("What is 2+2?");
        assert_eq!(result.decision, Tier::T2);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn long_plain_prose_is_t3() {
        let content = "This is a long explanation about how the system works overall today. \
            It describes several aspects of the design in plain sentences without any markup at all.";
        let result = classify(content);
        assert_eq!(result.decision, Tier::T3);
    }

    #[test]
    fn sql_requires_strong_or_weak_plus_distinct() {
        assert!(detect_sql("SELECT * FROM users WHERE id = 1"));
        assert!(!detect_sql("I will select the best option from the list we have."));
    }

    #[test]
    fn api_key_generic_rejects_bem_style_names() {
        assert!(!detect_api_key("the class is foo-bar-baz-qux-quux element"));
    }

    #[test]
    fn api_key_openai_style_detected() {
        assert!(detect_api_key("token: sk-abcdefghijklmnopqrstuvwx1234"));
    }

    #[test]
    fn classification_is_pure() {
        let a = classify("identical input string here");
        let b = classify("identical input string here");
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.reasons, b.reasons);
    }
}
