//! Exercises command implementations against real files on disk, the way
//! a caller of the `uc` binary would.

use std::fs;

use tempfile::tempdir;
use uc_cli::commands::{self, CompressArgs};
use uc_cli::OutputFormat;

#[test]
fn compress_then_expand_round_trips_through_files() {
    let dir = tempdir().unwrap();
    let messages = serde_json::json!([
        { "id": "1", "index": 0, "role": "system", "content": "You are concise." },
        { "id": "2", "index": 1, "role": "user", "content": "Hi there, quick question for you." },
        {
            "id": "3",
            "index": 2,
            "role": "assistant",
            "content": "Background detail that keeps repeating itself across many words here today. ".repeat(20)
        },
    ]);
    let input_path = dir.path().join("messages.json");
    fs::write(&input_path, serde_json::to_string_pretty(&messages).unwrap()).unwrap();

    let out_dir = dir.path().join("out");
    let args = CompressArgs {
        recency_window: Some(0),
        out_dir: out_dir.clone(),
        dedup: true,
        ..CompressArgs::default()
    };
    commands::compress_file(&input_path, args, OutputFormat::Json).unwrap();

    let compressed_path = out_dir.join("compressed.json");
    let verbatim_path = out_dir.join("verbatim.json");
    assert!(compressed_path.exists());
    assert!(verbatim_path.exists());

    commands::expand_files(&compressed_path, &verbatim_path, false, OutputFormat::Json).unwrap();
}

#[test]
fn estimate_tokens_reads_messages_file() {
    let dir = tempdir().unwrap();
    let messages = serde_json::json!([
        { "id": "1", "index": 0, "role": "user", "content": "hello" },
    ]);
    let path = dir.path().join("messages.json");
    fs::write(&path, serde_json::to_string_pretty(&messages).unwrap()).unwrap();

    commands::estimate_tokens_file(&path, OutputFormat::Json).unwrap();
}

#[test]
fn classify_reads_content_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snippet.txt");
    fs::write(&path, "```rust\nfn main() {}\n```").unwrap();

    commands::classify_file(&path, OutputFormat::Json).unwrap();
}
