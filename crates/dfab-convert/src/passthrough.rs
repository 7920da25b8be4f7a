use async_trait::async_trait;
use tracing::debug;

use crate::error::{ConversionError, ConversionResult};
use crate::traits::{normalize_newlines, ConversionSource, Converter};

const TEXT_TYPES: &[&str] = &["application/json", "application/xml"];
const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Converter for inputs that already are text.
///
/// Accepts `text/*`, JSON and XML content types plus `.md`, `.markdown` and
/// `.txt` filenames regardless of declared type. The bytes are decoded as
/// UTF-8 (a leading byte-order mark is dropped) and CRLF becomes LF.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughConverter;

impl PassthroughConverter {
    pub fn new() -> Self {
        Self
    }

    /// Whether this converter handles `source`.
    pub fn accepts(&self, source: &ConversionSource<'_>) -> bool {
        let essence = source.essence();
        essence.starts_with("text/")
            || TEXT_TYPES.contains(&essence.as_str())
            || source
                .extension()
                .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
    }
}

#[async_trait]
impl Converter for PassthroughConverter {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn convert(&self, source: &ConversionSource<'_>) -> ConversionResult<String> {
        if !self.accepts(source) {
            return Err(ConversionError::Unsupported {
                content_type: source.content_type.to_string(),
                filename: source.filename().to_string(),
            });
        }
        let text = std::str::from_utf8(source.data)
            .map_err(|_| ConversionError::InvalidUtf8(source.filename().to_string()))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        debug!(filename = source.filename(), bytes = source.data.len(), "passthrough conversion");
        Ok(normalize_newlines(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfab_blob::OriginalHandle;
    use dfab_types::DocumentId;

    fn handle(filename: &str) -> OriginalHandle {
        OriginalHandle {
            id: DocumentId::new(),
            filename: filename.into(),
            path: None,
        }
    }

    async fn convert(filename: &str, content_type: &str, data: &[u8]) -> ConversionResult<String> {
        let h = handle(filename);
        PassthroughConverter::new()
            .convert(&ConversionSource::new(&h, content_type, data))
            .await
    }

    #[tokio::test]
    async fn markdown_by_content_type() {
        let text = convert("doc", "text/markdown", b"# Title\r\nbody").await.unwrap();
        assert_eq!(text, "# Title\nbody");
    }

    #[tokio::test]
    async fn markdown_by_extension() {
        let text = convert("notes.MD", "application/octet-stream", b"# Notes")
            .await
            .unwrap();
        assert_eq!(text, "# Notes");
    }

    #[tokio::test]
    async fn json_and_xml_pass_through() {
        assert_eq!(
            convert("a", "application/json; charset=utf-8", b"{}").await.unwrap(),
            "{}"
        );
        assert_eq!(
            convert("a", "application/xml", b"<a/>").await.unwrap(),
            "<a/>"
        );
    }

    #[tokio::test]
    async fn bom_is_dropped() {
        let text = convert("a.txt", "text/plain", "\u{feff}hello".as_bytes())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn binary_types_are_unsupported() {
        let err = convert("report.pdf", "application/pdf", b"%PDF-1.7")
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));
        assert!(err.to_string().contains("report.pdf"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected() {
        let err = convert("a.txt", "text/plain", &[0xff, 0xfe, 0xfd])
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidUtf8(_)));
    }
}
