use async_trait::async_trait;
use std::path::Path;

use crate::domain::entities::ChunkDraft;

/// Result of structuring one document.
///
/// `Unsupported` and `Failed` are ordinary outcomes the processor records on
/// the document before moving on; they are not errors. Implementations map
/// their internal failures (I/O, transport, malformed model output) into
/// `Failed` with a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureOutcome {
    Structured(Vec<ChunkDraft>),
    Unsupported(String),
    Failed(String),
}

/// Capability converting a staged file into a list of chunk drafts.
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Identifier recorded in diagnostics, e.g. `"deterministic"`.
    fn provider_id(&self) -> &str;

    /// Check that the provider has everything it needs before a job starts.
    /// The default is always ready.
    fn validate_config(&self) -> Result<(), String> {
        Ok(())
    }

    async fn structure(&self, path: &Path, mime_type: &str) -> StructureOutcome;
}
