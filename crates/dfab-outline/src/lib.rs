//! Structural outline engine for DocFabric.
//!
//! [`outline`] scans normalized Markdown for ATX headings and returns a flat,
//! document-ordered [`Outline`] whose section offsets and lengths are in
//! characters, ready to pass to content slicing. [`SectionTree`] nests the
//! flat list into a forest for display.
//!
//! The engine is a pure function of the text and never fails.

pub mod engine;
pub mod tree;

pub use dfab_types::{Outline, Section};
pub use engine::outline;
pub use tree::{SectionNode, SectionTree};
