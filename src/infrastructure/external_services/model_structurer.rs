use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError};
use serde_json::{Value, json};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::application::ports::{StructureOutcome, Structurer, TextExtractor};
use crate::domain::entities::ChunkDraft;

/// Extensions the model path will attempt; everything else is unsupported
/// outright.
const SUPPORTED_EXTENSIONS: [&str; 11] = [
    ".txt", ".csv", ".md", ".markdown", ".json", ".xml", ".html", ".htm", ".pdf", ".docx", ".doc",
];

/// Upper bound on the text handed to the model in one request, in characters.
const SEGMENT_MAX_CHARS: usize = 12_000;

const SYSTEM_PROMPT: &str = "You split documents into semantically coherent chunks. \
Respond with a single JSON object and nothing else, using exactly this schema: \
{\"chunks\":[{\"chunkIndex\":0,\"text\":\"string\",\"metadata\":{}}]}. \
Each chunk's text must be a non-empty excerpt of the input. Do not add commentary.";

/// Which wire shape the configured backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStyle {
    /// `POST /api/generate` with `{model, prompt, stream, options}`.
    Native,
    /// `POST /v1/chat/completions` with chat messages.
    OpenAiChat,
}

#[derive(Debug, Clone)]
pub struct ModelStructurerConfig {
    pub base_url: String,
    pub model: String,
    pub api_style: ApiStyle,
    pub temperature: f32,
    pub num_ctx: Option<u32>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ModelStructurerConfig {
    fn default() -> Self {
        let base_url = env::var("STRUCTURER_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = env::var("STRUCTURER_MODEL").unwrap_or_else(|_| "llama3.1".to_string());
        let api_style = match env::var("STRUCTURER_API_STYLE").as_deref() {
            Ok("openai") => ApiStyle::OpenAiChat,
            _ => ApiStyle::Native,
        };
        let temperature = env::var("STRUCTURER_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let num_ctx = env::var("STRUCTURER_NUM_CTX").ok().and_then(|v| v.parse().ok());
        let max_tokens = env::var("STRUCTURER_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());
        let api_key = env::var("STRUCTURER_API_KEY").ok().filter(|k| !k.is_empty());

        Self {
            base_url,
            model,
            api_style,
            temperature,
            num_ctx,
            max_tokens,
            api_key,
            // Large documents against local models can be slow.
            timeout_secs: 300,
        }
    }
}

/// Structurer backed by a text-generation model speaking either the native
/// or the OpenAI-compatible chat protocol. The model's output is untyped;
/// everything it returns is validated shape by shape before any chunk is
/// accepted.
pub struct ModelStructurer {
    client: Client,
    config: ModelStructurerConfig,
    extractor: Arc<dyn TextExtractor>,
}

impl ModelStructurer {
    pub fn new(
        config: ModelStructurerConfig,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            extractor,
        })
    }

    pub fn from_env(extractor: Arc<dyn TextExtractor>) -> Result<Self, ReqwestError> {
        Self::new(ModelStructurerConfig::default(), extractor)
    }

    async fn run(&self, path: &Path, mime_type: &str, extension: &str) -> Result<Vec<ChunkDraft>, String> {
        let raw_text = self
            .extractor
            .extract(path)
            .await
            .map_err(|e| e.to_string())?;
        if raw_text.trim().is_empty() {
            return Err("no extractable text".to_string());
        }

        let text = normalize_newlines(&raw_text);
        let segments = segment_text(&text, SEGMENT_MAX_CHARS);
        let segment_count = segments.len();

        let mut drafts = Vec::new();
        for (segment_index, segment) in segments.iter().enumerate() {
            debug!(
                segment = segment_index + 1,
                of = segment_count,
                chars = segment.chars().count(),
                "structuring segment"
            );
            let response = self
                .request_completion(segment, mime_type, extension, segment_index, segment_count)
                .await?;
            let payload = salvage_json_object(&response)?;
            let segment_drafts = normalize_chunk_payload(&payload)?;
            if segment_drafts.is_empty() {
                return Err(format!(
                    "model returned no chunks for non-empty segment {}",
                    segment_index + 1
                ));
            }
            for mut draft in segment_drafts {
                draft.metadata = Some(augment_metadata(
                    draft.metadata.take(),
                    extension,
                    segment_index,
                ));
                drafts.push(draft);
            }
        }
        Ok(drafts)
    }

    async fn request_completion(
        &self,
        segment: &str,
        mime_type: &str,
        extension: &str,
        segment_index: usize,
        segment_count: usize,
    ) -> Result<String, String> {
        let user_prompt = format!(
            "Split the following document content into chunks.\n\
             File extension: {extension}\n\
             MIME type: {mime_type}\n\
             Segment {current} of {total}.\n\n\
             {segment}",
            current = segment_index + 1,
            total = segment_count,
        );

        let (url, body) = match self.config.api_style {
            ApiStyle::Native => {
                let mut options = json!({"temperature": self.config.temperature});
                if let Some(num_ctx) = self.config.num_ctx {
                    options["num_ctx"] = json!(num_ctx);
                }
                (
                    format!("{}/api/generate", self.config.base_url.trim_end_matches('/')),
                    json!({
                        "model": self.config.model,
                        "prompt": format!("{}\n\n{}", SYSTEM_PROMPT, user_prompt),
                        "stream": false,
                        "options": options,
                    }),
                )
            }
            ApiStyle::OpenAiChat => {
                let mut body = json!({
                    "model": self.config.model,
                    "messages": [
                        {"role": "system", "content": SYSTEM_PROMPT},
                        {"role": "user", "content": user_prompt},
                    ],
                    "temperature": self.config.temperature,
                });
                if let Some(max_tokens) = self.config.max_tokens {
                    body["max_tokens"] = json!(max_tokens);
                }
                (
                    format!(
                        "{}/v1/chat/completions",
                        self.config.base_url.trim_end_matches('/')
                    ),
                    body,
                )
            }
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("could not read response from {}: {}", url, e))?;
        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").map(|e| e.to_string()))
                .unwrap_or(body);
            return Err(format!("model endpoint returned {}: {}", status, detail));
        }
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| format!("response from {} was not JSON: {}", url, e))?;

        extract_completion_text(self.config.api_style, &payload)
    }
}

#[async_trait]
impl Structurer for ModelStructurer {
    fn provider_id(&self) -> &str {
        "model"
    }

    fn validate_config(&self) -> Result<(), String> {
        url::Url::parse(&self.config.base_url)
            .map_err(|e| format!("STRUCTURER_BASE_URL is not a valid URL: {}", e))?;
        if self.config.model.trim().is_empty() {
            return Err("STRUCTURER_MODEL is empty".to_string());
        }
        Ok(())
    }

    async fn structure(&self, path: &Path, mime_type: &str) -> StructureOutcome {
        let extension = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
            None => {
                return StructureOutcome::Unsupported(
                    "File has no extension to dispatch on".to_string(),
                );
            }
        };
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return StructureOutcome::Unsupported(format!(
                "Extension {} is not supported for structured extraction",
                extension
            ));
        }

        match self.run(path, mime_type, &extension).await {
            Ok(drafts) => StructureOutcome::Structured(drafts),
            Err(detail) => StructureOutcome::Failed(format!(
                "Structured extraction failed ({}/{}): {}",
                self.provider_id(),
                self.config.model,
                detail
            )),
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Split on character boundaries into segments of at most `max_chars`.
fn segment_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Pull the completion text out of either wire shape. Chat content may be a
/// plain string or an array of parts; parts contribute their string form or
/// their `text` field, in order.
fn extract_completion_text(api_style: ApiStyle, payload: &Value) -> Result<String, String> {
    match api_style {
        ApiStyle::Native => payload
            .get("response")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| "response payload has no 'response' string".to_string()),
        ApiStyle::OpenAiChat => {
            let content = payload
                .pointer("/choices/0/message/content")
                .ok_or_else(|| "response payload has no choices[0].message.content".to_string())?;
            Ok(join_chat_content(content))
        }
    }
}

fn join_chat_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => s.as_str(),
                other => other.get("text").and_then(Value::as_str).unwrap_or(""),
            })
            .collect(),
        _ => String::new(),
    }
}

/// Accept a bare JSON object, an object inside a fenced code block, or the
/// substring between the first `{` and the last `}`.
fn salvage_json_object(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    if let Some(fenced) = fenced_block_body(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced.trim()) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                if value.is_object() {
                    return Ok(value);
                }
            }
        }
    }

    Err("model output did not contain a JSON object".to_string())
}

fn fenced_block_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string line, e.g. "json".
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Validate the `chunks` array. Entries without a non-empty string `text`
/// are dropped; `metadata` survives only when it is an object. Index
/// assignment is left to chunk persistence, which is dense by construction.
fn normalize_chunk_payload(payload: &Value) -> Result<Vec<ChunkDraft>, String> {
    let chunks = payload
        .get("chunks")
        .ok_or_else(|| "model output has no 'chunks' field".to_string())?;
    let entries = chunks
        .as_array()
        .ok_or_else(|| "'chunks' is not an array".to_string())?;

    let mut drafts = Vec::new();
    for entry in entries {
        let Some(text) = entry.get("text").and_then(Value::as_str) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        let metadata = entry.get("metadata").filter(|m| m.is_object()).cloned();
        drafts.push(ChunkDraft {
            text: text.to_string(),
            metadata,
        });
    }
    Ok(drafts)
}

fn augment_metadata(metadata: Option<Value>, extension: &str, segment_index: usize) -> Value {
    let mut map = match metadata {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    map.insert("sourceExtension".to_string(), json!(extension));
    map.insert("segmentIndex".to_string(), json!(segment_index));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salvages_a_bare_object() {
        let value = salvage_json_object(r#"{"chunks": []}"#).unwrap();
        assert!(value.get("chunks").is_some());
    }

    #[test]
    fn salvages_a_fenced_block() {
        let raw = "Here you go:\n```json\n{\"chunks\": [{\"text\": \"a\"}]}\n```\nDone.";
        let value = salvage_json_object(raw).unwrap();
        assert_eq!(value["chunks"][0]["text"], "a");
    }

    #[test]
    fn salvages_braced_substring() {
        let raw = "Sure! The result is {\"chunks\": [{\"text\": \"a\"}]} as requested.";
        let value = salvage_json_object(raw).unwrap();
        assert_eq!(value["chunks"][0]["text"], "a");
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(salvage_json_object("{not-json").is_err());
        assert!(salvage_json_object("no braces at all").is_err());
        // A bare array is not the expected object shape.
        assert!(salvage_json_object("[1, 2, 3]").is_err());
    }

    #[test]
    fn normalize_drops_textless_entries_and_keeps_object_metadata() {
        let payload = serde_json::json!({
            "chunks": [
                {"chunkIndex": 7, "text": "first", "metadata": {"page": 1}},
                {"chunkIndex": 2, "text": "   "},
                {"chunkIndex": 3},
                {"chunkIndex": 4, "text": "second", "metadata": "not-an-object"},
            ]
        });

        let drafts = normalize_chunk_payload(&payload).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].text, "first");
        assert_eq!(drafts[0].metadata, Some(serde_json::json!({"page": 1})));
        assert_eq!(drafts[1].text, "second");
        assert_eq!(drafts[1].metadata, None);
    }

    #[test]
    fn normalize_rejects_non_array_chunks() {
        assert!(normalize_chunk_payload(&serde_json::json!({"chunks": "nope"})).is_err());
        assert!(normalize_chunk_payload(&serde_json::json!({"other": []})).is_err());
    }

    #[test]
    fn segments_split_on_character_boundaries() {
        let text = "abcdefghij";
        assert_eq!(segment_text(text, 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(segment_text(text, 10), vec!["abcdefghij"]);
        assert_eq!(segment_text(text, 11), vec!["abcdefghij"]);

        // Multi-byte characters count as one.
        let accented = "ééééé";
        assert_eq!(segment_text(accented, 2), vec!["éé", "éé", "é"]);
    }

    #[test]
    fn crlf_normalization() {
        assert_eq!(normalize_newlines("a\r\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn chat_content_string_is_taken_verbatim() {
        let payload = serde_json::json!({
            "choices": [{"message": {"content": "{\"chunks\":[]}"}}]
        });
        assert_eq!(
            extract_completion_text(ApiStyle::OpenAiChat, &payload).unwrap(),
            "{\"chunks\":[]}"
        );
    }

    #[test]
    fn chat_content_array_concatenates_in_order() {
        let payload = serde_json::json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "{\"chunks\":"},
                "[{\"text\":\"a\"}]",
                {"type": "image", "url": "ignored"},
                {"type": "text", "text": "}"},
            ]}}]
        });
        assert_eq!(
            extract_completion_text(ApiStyle::OpenAiChat, &payload).unwrap(),
            "{\"chunks\":[{\"text\":\"a\"}]}"
        );
    }

    #[test]
    fn native_response_field_is_required() {
        let payload = serde_json::json!({"response": "hello"});
        assert_eq!(
            extract_completion_text(ApiStyle::Native, &payload).unwrap(),
            "hello"
        );
        assert!(extract_completion_text(ApiStyle::Native, &serde_json::json!({})).is_err());
    }

    #[test]
    fn metadata_augmentation_adds_provenance() {
        let augmented = augment_metadata(Some(serde_json::json!({"page": 3})), ".pdf", 1);
        assert_eq!(
            augmented,
            serde_json::json!({"page": 3, "sourceExtension": ".pdf", "segmentIndex": 1})
        );

        let fresh = augment_metadata(None, ".txt", 0);
        assert_eq!(
            fresh,
            serde_json::json!({"sourceExtension": ".txt", "segmentIndex": 0})
        );
    }
}
