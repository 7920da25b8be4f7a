//! Heading scanner.
//!
//! A heading is a line starting with one to six `#` characters, at least one
//! space or tab, and a non-blank title. Everything else (`#tag`, `#######`,
//! a bare `##`) is body text. Each section runs from its marker to the next
//! heading of equal or shallower level, or to the end of the text.

use dfab_types::{Outline, Section};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(\S[^\n]*)$").unwrap());

/// A heading found by the scan, before its section end is known.
struct Marker {
    level: u8,
    title: String,
    offset: usize,
}

/// Scan `text` for headings, reporting character offsets.
fn scan(text: &str) -> (Vec<Marker>, usize) {
    let mut markers = Vec::new();
    let mut byte_pos = 0;
    let mut char_pos = 0;

    for caps in HEADING_RE.captures_iter(text) {
        let (Some(whole), Some(hashes), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        char_pos += text[byte_pos..whole.start()].chars().count();
        byte_pos = whole.start();
        markers.push(Marker {
            level: hashes.len() as u8,
            title: title.as_str().trim().to_string(),
            offset: char_pos,
        });
    }

    let total_length = char_pos + text[byte_pos..].chars().count();
    (markers, total_length)
}

/// Build the flat outline of `text`.
///
/// Sections come back in document order. A text without headings yields an
/// empty section list and its character count as `total_length`.
pub fn outline(text: &str) -> Outline {
    let (markers, total_length) = scan(text);

    // ends[i] is the offset of the first later marker at level <= markers[i].level
    let mut ends = vec![total_length; markers.len()];
    let mut open: Vec<usize> = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        while let Some(&top) = open.last() {
            if markers[top].level < marker.level {
                break;
            }
            ends[top] = marker.offset;
            open.pop();
        }
        open.push(i);
    }

    let sections = markers
        .into_iter()
        .zip(ends)
        .map(|(marker, end)| Section {
            level: marker.level,
            title: marker.title,
            offset: marker.offset,
            length: end - marker.offset,
        })
        .collect();

    Outline {
        sections,
        total_length,
    }
}
