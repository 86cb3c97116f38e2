use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tokio::fs;

use crate::application::ports::{StructureOutcome, Structurer};
use crate::domain::entities::ChunkDraft;

/// Rule-based structurer used when no model backend is configured.
///
/// CSV files become one chunk per non-empty row; Markdown files one chunk
/// per heading block. Everything else is unsupported.
pub struct DeterministicStructurer;

impl DeterministicStructurer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeterministicStructurer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Structurer for DeterministicStructurer {
    fn provider_id(&self) -> &str {
        "deterministic"
    }

    async fn structure(&self, path: &Path, _mime_type: &str) -> StructureOutcome {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()));

        let rule = match extension.as_deref() {
            Some(".csv") => csv_chunks as fn(&str) -> Vec<ChunkDraft>,
            Some(".md") | Some(".markdown") => markdown_chunks,
            Some(other) => {
                return StructureOutcome::Unsupported(format!(
                    "No deterministic structurer for {} files",
                    other
                ));
            }
            None => {
                return StructureOutcome::Unsupported(
                    "File has no extension to dispatch on".to_string(),
                );
            }
        };

        match fs::read_to_string(path).await {
            Ok(content) => StructureOutcome::Structured(rule(&content)),
            Err(err) => StructureOutcome::Failed(format!(
                "Could not read {}: {}",
                path.display(),
                err
            )),
        }
    }
}

/// One chunk per non-empty row, commas rendered as ` | ` separators.
fn csv_chunks(content: &str) -> Vec<ChunkDraft> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            ChunkDraft::with_metadata(
                line.replace(',', " | "),
                json!({"source": "csv-row", "row": row + 1}),
            )
        })
        .collect()
}

/// One chunk per block, split where a newline is followed by a heading
/// marker.
fn markdown_chunks(content: &str) -> Vec<ChunkDraft> {
    split_before_headings(content)
        .into_iter()
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(block_number, block)| {
            ChunkDraft::with_metadata(
                block,
                json!({"source": "markdown-block", "block": block_number + 1}),
            )
        })
        .collect()
}

fn split_before_headings(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b'\n' && bytes.get(i + 1) == Some(&b'#') {
            blocks.push(&text[start..i]);
            start = i + 1;
        }
    }
    blocks.push(&text[start..]);
    blocks
}
