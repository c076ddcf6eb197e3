//! Command implementations invoked from `main.rs`'s dispatch match.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use uc_core::{
    classify, compress, estimate_tokens, estimate_tokens_total, search, uncompress, CompressOptions,
    ExpandOptions, Message, VerbatimMap,
};

use crate::output::{self, OutputFormat};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(data)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

pub fn classify_file(path: &Path, format: OutputFormat) -> Result<()> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let result = classify(&content);
    match format {
        OutputFormat::Human => {
            output::kv(format, "decision", format!("{:?}", result.decision));
            output::kv(format, "confidence", result.confidence);
            output::kv(format, "reasons", result.reasons.join(", "));
        }
        OutputFormat::Plain | OutputFormat::Json => output::emit(&result)?,
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct CompressArgs {
    pub recency_window: Option<usize>,
    pub token_budget: Option<u32>,
    pub min_recency_window: Option<usize>,
    pub dedup: bool,
    pub fuzzy_dedup: bool,
    pub fuzzy_threshold: Option<f64>,
    pub out_dir: PathBuf,
}

pub fn compress_file(path: &Path, args: CompressArgs, format: OutputFormat) -> Result<()> {
    let messages: Vec<Message> = read_json(path)?;

    let mut options = CompressOptions {
        dedup: args.dedup,
        fuzzy_dedup: args.fuzzy_dedup,
        ..CompressOptions::default()
    };
    if let Some(window) = args.recency_window {
        options.recency_window = window;
    }
    if let Some(budget) = args.token_budget {
        options.token_budget = Some(budget);
    }
    if let Some(min_window) = args.min_recency_window {
        options.min_recency_window = min_window;
    }
    if let Some(threshold) = args.fuzzy_threshold {
        options.fuzzy_threshold = threshold;
    }

    let result = compress(&messages, &options)?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    write_json(&args.out_dir.join("compressed.json"), &result.messages)?;
    write_json(&args.out_dir.join("verbatim.json"), &result.verbatim)?;

    tracing::info!(
        messages_compressed = result.stats.messages_compressed,
        messages_preserved = result.stats.messages_preserved,
        "compress: wrote output"
    );

    match format {
        OutputFormat::Human => {
            output::success(format, format!("wrote {}", args.out_dir.join("compressed.json").display()));
            output::kv(format, "ratio", result.stats.ratio);
            output::kv(format, "messages_compressed", result.stats.messages_compressed);
            output::kv(format, "messages_preserved", result.stats.messages_preserved);
            if let Some(fits) = result.fits {
                output::kv(format, "fits", fits);
                output::kv(format, "recency_window", result.recency_window.unwrap_or_default());
            }
        }
        OutputFormat::Plain | OutputFormat::Json => output::emit(&result.stats)?,
    }
    Ok(())
}

pub fn expand_files(compressed_path: &Path, verbatim_path: &Path, recursive: bool, format: OutputFormat) -> Result<()> {
    let compressed: Vec<Message> = read_json(compressed_path)?;
    let verbatim: VerbatimMap = read_json(verbatim_path)?;
    let options = ExpandOptions { recursive };
    let result = uncompress(&compressed, &verbatim, &options);

    if !result.missing_ids.is_empty() {
        output::warning(format, format!("missing {} verbatim entr(ies)", result.missing_ids.len()));
    }

    match format {
        OutputFormat::Human => {
            output::kv(format, "messages_expanded", result.messages_expanded);
            output::kv(format, "messages_passthrough", result.messages_passthrough);
            output::kv(format, "missing_ids", result.missing_ids.join(", "));
        }
        OutputFormat::Plain | OutputFormat::Json => output::emit(&result)?,
    }
    Ok(())
}

pub fn search_files(compressed_path: &Path, verbatim_path: &Path, pattern: &str, format: OutputFormat) -> Result<()> {
    let compressed: Vec<Message> = read_json(compressed_path)?;
    let verbatim: VerbatimMap = read_json(verbatim_path)?;
    let results = search(&compressed, &verbatim, pattern)?;

    match format {
        OutputFormat::Human => {
            let mut table = output::TableBuilder::new().header(["message_id", "summary_id", "matches"]);
            for r in &results {
                table = table.row([r.message_id.clone(), r.summary_id.clone(), r.matches.len().to_string()]);
            }
            table.print();
        }
        OutputFormat::Plain | OutputFormat::Json => output::emit(&results)?,
    }
    Ok(())
}

pub fn estimate_tokens_file(path: &Path, format: OutputFormat) -> Result<()> {
    let messages: Vec<Message> = read_json(path)?;
    let total = estimate_tokens_total(&messages);
    let per_message: HashMap<String, u32> = messages
        .iter()
        .map(|m| (m.id.clone(), estimate_tokens(m)))
        .collect();

    match format {
        OutputFormat::Human => {
            output::kv(format, "total_tokens", total);
            let mut table = output::TableBuilder::new().header(["message_id", "tokens"]);
            for m in &messages {
                table = table.row([m.id.clone(), estimate_tokens(m).to_string()]);
            }
            table.print();
        }
        OutputFormat::Plain | OutputFormat::Json => {
            #[derive(Serialize)]
            struct Estimate {
                total: u32,
                per_message: HashMap<String, u32>,
            }
            output::emit(&Estimate { total, per_message })?;
        }
    }
    Ok(())
}
