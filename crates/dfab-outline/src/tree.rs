use dfab_types::{Outline, Section};
use serde::Serialize;

/// A section together with the sections nested inside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionNode {
    #[serde(flatten)]
    pub section: Section,
    pub children: Vec<SectionNode>,
}

/// Nested view of an [`Outline`].
///
/// A node's children are the following sections of greater depth, up to the
/// next section at the node's own level or shallower. Sections with no
/// shallower predecessor become roots, so a document opening at `##` still
/// has a well-formed forest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SectionTree {
    pub roots: Vec<SectionNode>,
    pub total_length: usize,
}

impl SectionTree {
    /// Nest the flat section list of `outline`.
    pub fn build(outline: &Outline) -> Self {
        let mut pos = 0;
        let roots = nest(&outline.sections, &mut pos, 0);
        Self {
            roots,
            total_length: outline.total_length,
        }
    }

    /// Total number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first traversal yielding `(depth, section)`, roots at depth 0.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Section)> {
        let mut stack: Vec<(usize, &SectionNode)> =
            self.roots.iter().rev().map(|node| (0, node)).collect();
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
            Some((depth, &node.section))
        })
    }
}

fn nest(sections: &[Section], pos: &mut usize, parent_level: u8) -> Vec<SectionNode> {
    let mut nodes = Vec::new();
    while let Some(section) = sections.get(*pos) {
        if section.level <= parent_level {
            break;
        }
        *pos += 1;
        let children = nest(sections, pos, section.level);
        nodes.push(SectionNode {
            section: section.clone(),
            children,
        });
    }
    nodes
}
