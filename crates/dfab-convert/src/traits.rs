use std::path::Path;

use async_trait::async_trait;
use dfab_blob::OriginalHandle;

use crate::error::ConversionResult;

/// Everything a converter may look at: the stored original and its bytes.
#[derive(Clone, Copy, Debug)]
pub struct ConversionSource<'a> {
    pub handle: &'a OriginalHandle,
    /// Content type declared by the uploader.
    pub content_type: &'a str,
    pub data: &'a [u8],
}

impl<'a> ConversionSource<'a> {
    pub fn new(handle: &'a OriginalHandle, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            handle,
            content_type,
            data,
        }
    }

    pub fn filename(&self) -> &'a str {
        &self.handle.filename
    }

    /// Lowercased filename extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.handle.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Media type without parameters, lowercased (`Text/HTML; charset=x` -> `text/html`).
    pub fn essence(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

/// Turns a stored original into normalized Markdown text.
///
/// Implementations are opaque to the lifecycle layer: any error aborts the
/// create or update that triggered the conversion.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Convert `source` to normalized text.
    async fn convert(&self, source: &ConversionSource<'_>) -> ConversionResult<String>;
}

/// Normalize line endings to `\n`.
pub(crate) fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfab_types::DocumentId;

    fn handle(filename: &str) -> OriginalHandle {
        OriginalHandle {
            id: DocumentId::new(),
            filename: filename.into(),
            path: None,
        }
    }

    #[test]
    fn essence_strips_parameters() {
        let h = handle("a.txt");
        let source = ConversionSource::new(&h, " Text/Plain ; charset=UTF-8", b"");
        assert_eq!(source.essence(), "text/plain");
    }

    #[test]
    fn extension_is_lowercased() {
        let h = handle("Notes.MD");
        let source = ConversionSource::new(&h, "application/octet-stream", b"");
        assert_eq!(source.extension().as_deref(), Some("md"));

        let bare = handle("README");
        assert!(ConversionSource::new(&bare, "", b"").extension().is_none());
    }

    #[test]
    fn newlines_are_normalized() {
        assert_eq!(normalize_newlines("a\r\nb\r\n".into()), "a\nb\n");
        assert_eq!(normalize_newlines("a\nb".into()), "a\nb");
    }
}
