use serde::{Deserialize, Serialize};

/// One heading-delimited section of a document's derived text.
///
/// `offset` and `length` are character counts and can be passed straight to
/// [`ContentSlice::from_text`](crate::ContentSlice::from_text).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading depth, 1 through 6.
    pub level: u8,
    pub title: String,
    /// Character offset of the heading marker.
    pub offset: usize,
    /// Characters up to the next heading of equal or shallower level.
    pub length: usize,
}

impl Section {
    /// Exclusive character offset where this section ends.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Whether `other` lies within this section's span.
    pub fn contains(&self, other: &Section) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }
}

/// Flat, document-ordered list of sections plus the text's character count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub sections: Vec<Section>,
    pub total_length: usize,
}

impl Outline {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
