use serde::{Deserialize, Serialize};

/// A bounded window into a document's derived text.
///
/// All positions are character (Unicode scalar value) counts, never byte
/// offsets, so they line up with the offsets produced by the outline engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSlice {
    pub content: String,
    /// Character count of the whole derived text.
    pub total_length: usize,
    /// The requested start offset (reported as asked, even past the end).
    pub offset: usize,
    /// Character count of `content`.
    pub length: usize,
}

impl ContentSlice {
    /// Cut `[offset, offset + limit)` out of `text`, clamped to the text.
    ///
    /// `offset` defaults to 0 and a missing `limit` reads to the end. An
    /// offset past the end yields an empty slice rather than an error.
    pub fn from_text(text: &str, offset: Option<usize>, limit: Option<usize>) -> Self {
        let total_length = text.chars().count();
        let start = offset.unwrap_or(0);
        let end = match limit {
            Some(limit) => start.saturating_add(limit),
            None => total_length,
        }
        .min(total_length);

        let content: String = if start < end {
            text.chars().skip(start).take(end - start).collect()
        } else {
            String::new()
        };
        let length = content.chars().count();

        Self {
            content,
            total_length,
            offset: start,
            length,
        }
    }

    /// Returns `true` if the slice does not cover the whole text.
    pub fn is_partial(&self) -> bool {
        self.length < self.total_length
    }

    /// Render for tool-calling clients: partial slices carry a trailer
    /// telling the caller where it is in the document.
    pub fn to_tool_text(&self) -> String {
        if !self.is_partial() {
            return self.content.clone();
        }
        format!(
            "{}\n\n---\n[offset={} length={} total={}]",
            self.content, self.offset, self.length, self.total_length
        )
    }
}
