use async_trait::async_trait;
use html2text::from_read;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{TextExtractionError, TextExtractor};

const HTML_RENDER_WIDTH: usize = 120;

/// Extension-dispatched extractor: the plain-text family is read as UTF-8,
/// HTML is rendered to text, PDFs go through lopdf. Word documents have no
/// extractor here and are reported as such.
pub struct CompositeTextExtractor;

impl CompositeTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompositeTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for CompositeTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, TextExtractionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .ok_or_else(|| {
                TextExtractionError::UnsupportedExtension("<no extension>".to_string())
            })?;

        match extension.as_str() {
            ".txt" | ".csv" | ".md" | ".markdown" | ".json" | ".xml" => {
                fs::read_to_string(path)
                    .await
                    .map_err(|e| TextExtractionError::IoError(e.to_string()))
            }
            ".html" | ".htm" => {
                let html = fs::read_to_string(path)
                    .await
                    .map_err(|e| TextExtractionError::IoError(e.to_string()))?;
                Ok(from_read(html.as_bytes(), HTML_RENDER_WIDTH))
            }
            ".pdf" => extract_pdf_text(path.to_path_buf()).await,
            ".docx" | ".doc" => Err(TextExtractionError::NoExtractor(extension)),
            other => Err(TextExtractionError::UnsupportedExtension(other.to_string())),
        }
    }
}

async fn extract_pdf_text(path: PathBuf) -> Result<String, TextExtractionError> {
    tokio::task::spawn_blocking(move || {
        let document = Document::load(&path)
            .map_err(|e| TextExtractionError::CorruptedFile(e.to_string()))?;
        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        document
            .extract_text(&pages)
            .map_err(|e| TextExtractionError::CorruptedFile(e.to_string()))
    })
    .await
    .map_err(|e| TextExtractionError::IoError(format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_plain_text_family() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain contents").unwrap();

        let text = CompositeTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(text, "plain contents");
    }

    #[tokio::test]
    async fn renders_html_to_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<html><body><p>Hello <b>there</b></p></body></html>").unwrap();

        let text = CompositeTextExtractor::new().extract(&path).await.unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("there"));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn word_documents_report_missing_extractor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        fs::write(&path, "not really a docx").unwrap();

        let err = CompositeTextExtractor::new()
            .extract(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, TextExtractionError::NoExtractor(_)));
    }

    #[tokio::test]
    async fn unknown_extensions_are_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.png");
        fs::write(&path, [0u8, 1, 2]).unwrap();

        let err = CompositeTextExtractor::new()
            .extract(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, TextExtractionError::UnsupportedExtension(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = CompositeTextExtractor::new()
            .extract(Path::new("/nonexistent/notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TextExtractionError::IoError(_)));
    }
}
