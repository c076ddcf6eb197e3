//! Deterministic extractive summarization, plus the optional async
//! `Summarizer` capability with LLM -> deterministic -> size-guard fallback.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_BUDGET: usize = 400;
const SEPARATOR: &str = " ... ";
const SEPARATOR_COST: usize = 5;
const ELLIPSIS: &str = "…";

static EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:importantly|however|critical|crucial|essential|significant|notably|must|requires?|required|never|always)\b")
        .unwrap()
});
static FILLER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:great|sure|ok|okay|thanks|got it|no problem|certainly|absolutely)[,.!?\s]")
        .unwrap()
});
static CAMEL_SNAKE_IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[a-z]+(?:[A-Z][a-z0-9]*)+|[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]*)+|[a-z][a-z0-9]*(?:_[a-z0-9]+)+)\b")
        .unwrap()
});
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:ms|mb|gb|kb|%|retries|workers|attempts|requests|reqs)\b")
        .unwrap()
});
static VOWELLESS_ABBREV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[bcdfghjklmnpqrstvwxz]{3,}\b").unwrap());
static STATUS_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:PASS|FAIL|ERROR|WARNING|WARN)\b").unwrap());
static GREP_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w./\\-]+\.\w+:\d+:").unwrap());

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?\n]+[.!?]+").unwrap());

static GREP_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w./\\-]+\.\w+:\d+:").unwrap());
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*•]\s+").unwrap());
static KEY_VALUE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[\w.-]+\s*[:=]\s*\S").unwrap());
static STATUS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:PASS|FAIL|ERROR|WARN|WARNING|OK|SKIP)\b").unwrap());
static FILE_PATH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:[\w.-]+/)+[\w.-]+").unwrap());

/// Split `text` into paragraphs on blank lines.
fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a paragraph into sentences; paragraphs without terminal
/// punctuation are treated as one whole sentence.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let sentences: Vec<String> = SENTENCE_SPLIT
        .find_iter(paragraph)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        vec![paragraph.trim().to_string()]
    } else {
        sentences
    }
}

fn score_sentence(sentence: &str) -> i32 {
    let mut score = 0i32;
    score += 3 * CAMEL_SNAKE_IDENT.find_iter(sentence).count() as i32;
    if EMPHASIS.is_match(sentence) {
        score += 4;
    }
    score += 2 * NUMBER_WITH_UNIT.find_iter(sentence).count() as i32;
    score += 2 * VOWELLESS_ABBREV.find_iter(sentence).count() as i32;
    score += 3 * STATUS_TOKEN.find_iter(sentence).count() as i32;
    score += 2 * GREP_REFERENCE.find_iter(sentence).count() as i32;
    let len = sentence.chars().count();
    if (40..=120).contains(&len) {
        score += 2;
    }
    if FILLER_PREFIX.is_match(sentence) {
        score -= 10;
    }
    score
}

struct ScoredSentence {
    text: String,
    score: i32,
    position: usize,
    is_primary: bool,
}

fn truncate_with_ellipsis(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    if budget == 0 {
        return String::new();
    }
    let keep = budget.saturating_sub(ELLIPSIS.chars().count());
    let truncated: String = text.chars().take(keep).collect();
    format!("{truncated}{ELLIPSIS}")
}

/// Extractive summarizer. Produces a string whose length is at most
/// `budget` characters (falling back to a truncated top sentence if no
/// positive-score sentence could be packed).
pub fn summarize(text: &str, budget: Option<usize>) -> String {
    let budget = budget.unwrap_or(DEFAULT_BUDGET);
    let paragraphs = split_paragraphs(text);
    if paragraphs.is_empty() {
        return truncate_with_ellipsis(text.trim(), budget);
    }

    let mut position = 0usize;
    let mut all: Vec<ScoredSentence> = Vec::new();
    for paragraph in &paragraphs {
        let sentences = split_sentences(paragraph);
        let mut best_index = 0usize;
        let mut best_score = i32::MIN;
        let scored: Vec<(String, i32)> = sentences
            .into_iter()
            .map(|s| {
                let score = score_sentence(&s);
                (s, score)
            })
            .collect();
        for (i, (_, score)) in scored.iter().enumerate() {
            if *score > best_score {
                best_score = *score;
                best_index = i;
            }
        }
        for (i, (text, score)) in scored.into_iter().enumerate() {
            all.push(ScoredSentence {
                text,
                score,
                position,
                is_primary: i == best_index,
            });
            position += 1;
        }
    }

    let mut primary: Vec<&ScoredSentence> = all.iter().filter(|s| s.is_primary).collect();
    primary.sort_by(|a, b| b.score.cmp(&a.score));
    let mut secondary: Vec<&ScoredSentence> = all.iter().filter(|s| !s.is_primary).collect();
    secondary.sort_by(|a, b| b.score.cmp(&a.score));

    let mut picked_positions: Vec<usize> = Vec::new();
    let mut picked_texts: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let mut used = 0usize;

    for sentence in primary.into_iter().chain(secondary.into_iter()) {
        if sentence.score < 0 {
            continue;
        }
        if picked_texts.contains(sentence.text.as_str()) {
            continue;
        }
        let sep_cost = if picked_positions.is_empty() { 0 } else { SEPARATOR_COST };
        let len = sentence.text.chars().count();
        if used + sep_cost + len <= budget {
            used += sep_cost + len;
            picked_positions.push(sentence.position);
            picked_texts.insert(sentence.text.as_str());
        }
    }

    if picked_positions.is_empty() {
        let top = all.iter().max_by_key(|s| s.score);
        return match top {
            Some(s) => truncate_with_ellipsis(&s.text, budget),
            None => truncate_with_ellipsis(text.trim(), budget),
        };
    }

    picked_positions.sort_unstable();
    let joined = picked_positions
        .iter()
        .map(|pos| all[*pos].text.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    truncate_with_ellipsis(&joined, budget)
}

/// True iff `text` looks like structured tool output (grep/test/lint
/// style): enough lines, high newline density, and a majority of lines
/// matching a status/reference/bullet/key-value shape.
pub fn is_structured_output(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 6 {
        return false;
    }
    let density = text.chars().filter(|c| *c == '\n').count() as f64 / text.chars().count().max(1) as f64;
    if density <= 1.0 / 80.0 {
        return false;
    }
    let matching = lines
        .iter()
        .filter(|line| {
            GREP_LINE.is_match(line)
                || BULLET_LINE.is_match(line)
                || KEY_VALUE_LINE.is_match(line)
                || STATUS_LINE.is_match(line)
        })
        .count();
    matching as f64 / lines.len() as f64 > 0.5
}

/// Specialization for structured tool output: `files: f1, f2, f3 +N more |
/// <up to 3 status/summary lines>`, or a head/tail fallback.
pub fn summarize_structured(text: &str, budget: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut files: Vec<&str> = Vec::new();
    let mut seen_files = std::collections::HashSet::new();
    for line in &lines {
        if let Some(m) = FILE_PATH_TOKEN.find(line) {
            if seen_files.insert(m.as_str()) {
                files.push(m.as_str());
            }
        }
    }

    let status_lines: Vec<&str> = lines
        .iter()
        .filter(|l| STATUS_LINE.is_match(l))
        .take(3)
        .copied()
        .collect();

    if !files.is_empty() || !status_lines.is_empty() {
        let mut parts: Vec<String> = Vec::new();
        if !files.is_empty() {
            let shown = files.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            let extra = files.len().saturating_sub(3);
            if extra > 0 {
                parts.push(format!("files: {shown} +{extra} more"));
            } else {
                parts.push(format!("files: {shown}"));
            }
        }
        parts.extend(status_lines.into_iter().map(str::to_string));
        return truncate_with_ellipsis(&parts.join(" | "), budget);
    }

    let head: Vec<&str> = lines.iter().take(3).copied().collect();
    let tail = lines.last().copied().unwrap_or("");
    let fallback = format!("{} | ... | {} ({} lines)", head.join(" "), tail, lines.len());
    truncate_with_ellipsis(&fallback, budget)
}

/// Summarize `text`, dispatching to the structured specialization when
/// the content looks like tool output.
pub fn summarize_auto(text: &str, budget: usize) -> String {
    if is_structured_output(text) {
        summarize_structured(text, budget)
    } else {
        summarize(text, Some(budget))
    }
}

/// Aggressiveness level for the async summarizer capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    Normal,
    Aggressive,
}

/// Options for `create_summarizer` / `create_escalating_summarizer`.
#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub preserve_terms: Vec<String>,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            system_prompt: None,
            preserve_terms: Vec::new(),
        }
    }
}

/// User-supplied LLM call: given a rendered prompt, return the model's
/// text completion (or an error, which the summarizer swallows).
#[async_trait]
pub trait LlmCall: Send + Sync {
    async fn call(&self, prompt: &str) -> anyhow::Result<String>;
}

/// The opaque capability `compress` accepts for LLM-backed summarization.
/// Its default-shaped implementation (`create_summarizer`) always falls
/// back to the deterministic extractive summarizer.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, budget: usize) -> String;
}

fn render_prompt(text: &str, options: &SummarizerOptions, mode: SummaryMode) -> String {
    let max_tokens = match mode {
        SummaryMode::Normal => options.max_tokens,
        SummaryMode::Aggressive => (options.max_tokens / 2).max(1),
    };
    let instruction = match mode {
        SummaryMode::Normal => "Summarize the following text.",
        SummaryMode::Aggressive => "Summarize the following text as terse bullet points.",
    };
    let mut preserve = vec![
        "code references".to_string(),
        "file paths".to_string(),
        "identifiers".to_string(),
        "URLs".to_string(),
        "API keys".to_string(),
        "error messages".to_string(),
        "numbers".to_string(),
        "technical decisions".to_string(),
    ];
    preserve.extend(options.preserve_terms.iter().cloned());

    let mut header = String::new();
    if let Some(system) = &options.system_prompt {
        header.push_str(system);
        header.push('\n');
    }
    header.push_str(instruction);
    header.push('\n');
    header.push_str(&format!("Keep the summary under {max_tokens} tokens.\n"));
    header.push_str(&format!(
        "Preserve: {}. Remove filler. Keep register. Output only the summary.\n",
        preserve.join(", ")
    ));
    header.push_str(&format!("Text:\n{text}"));
    header
}

struct LlmBackedSummarizer {
    call_llm: Arc<dyn LlmCall>,
    options: SummarizerOptions,
    mode: SummaryMode,
}

#[async_trait]
impl Summarizer for LlmBackedSummarizer {
    async fn summarize(&self, text: &str, budget: usize) -> String {
        let prompt = render_prompt(text, &self.options, self.mode);
        match self.call_llm.call(&prompt).await {
            Ok(result) if !result.is_empty() && result.chars().count() < text.chars().count() => {
                result
            }
            _ => summarize_auto(text, budget),
        }
    }
}

/// Wrap a user LLM call into a `Summarizer` using the fixed prompt
/// template. Falls through to the deterministic summarizer whenever the
/// callback errors, returns empty, or does not shorten the input.
pub fn create_summarizer(call_llm: Arc<dyn LlmCall>, options: SummarizerOptions) -> Arc<dyn Summarizer> {
    Arc::new(LlmBackedSummarizer {
        call_llm,
        options,
        mode: SummaryMode::Normal,
    })
}

struct EscalatingSummarizer {
    call_llm: Arc<dyn LlmCall>,
    options: SummarizerOptions,
}

#[async_trait]
impl Summarizer for EscalatingSummarizer {
    async fn summarize(&self, text: &str, budget: usize) -> String {
        let normal_prompt = render_prompt(text, &self.options, SummaryMode::Normal);
        if let Ok(result) = self.call_llm.call(&normal_prompt).await {
            if !result.is_empty() && result.chars().count() < text.chars().count() {
                return result;
            }
        }
        let aggressive_prompt = render_prompt(text, &self.options, SummaryMode::Aggressive);
        match self.call_llm.call(&aggressive_prompt).await {
            Ok(result) if !result.is_empty() && result.chars().count() < text.chars().count() => {
                result
            }
            _ => summarize_auto(text, budget),
        }
    }
}

/// Run `normal` first; if the result is empty, not shorter, or errors,
/// retry at half the response budget with the "aggressive" prompt before
/// falling back to the deterministic summarizer.
pub fn create_escalating_summarizer(
    call_llm: Arc<dyn LlmCall>,
    options: SummarizerOptions,
) -> Arc<dyn Summarizer> {
    Arc::new(EscalatingSummarizer { call_llm, options })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_respects_budget() {
        let text = "This is a long paragraph. It keeps going on and on about nothing much. \
            It repeats itself in various uninteresting ways for quite a while longer still.";
        let result = summarize(text, Some(40));
        assert!(result.chars().count() <= 40);
    }

    #[test]
    fn preserves_critical_sentence() {
        let text = format!(
            "{}\n\nCritical: retries must not exceed 3 attempts.",
            "Filler sentence number one that says nothing important at all today.".repeat(3)
        );
        let result = summarize(&text, Some(400));
        assert!(result.contains("retries must not exceed 3"));
    }

    #[test]
    fn filler_prefix_is_penalized() {
        let score = score_sentence("Thanks, that all makes sense to me.");
        assert!(score < 0);
    }

    #[test]
    fn structured_output_detection() {
        let text = "src/a.rs:10: PASS test_one\nsrc/b.rs:20: FAIL test_two\nsrc/c.rs:30: PASS test_three\n- note one\n- note two\nkey: value\n";
        assert!(is_structured_output(text));
    }

    #[test]
    fn structured_summary_extracts_files() {
        let text = "src/a.rs:10: PASS test_one\nsrc/b.rs:20: FAIL test_two\nsrc/c.rs:30: PASS test_three\n- note one\n- note two\nkey: value\n";
        let result = summarize_structured(text, 200);
        assert!(result.starts_with("files:"));
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        assert_eq!(summarize("", Some(100)), "");
    }
}
