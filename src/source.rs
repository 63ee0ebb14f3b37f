//! Tagged source text and the position-stable edit index.
//!
//! A [`Source`] is text where every character remembers where it came from:
//! its byte offset in the cell the user typed and the file it was typed in,
//! or nothing when a rewrite synthesized it.
//!
//! An [`EditIndex`] holds one [`EditNode`] per byte of the text that was last
//! parsed. Rewrites address nodes by the parser's offsets, so any number of
//! non-overlapping edits computed from one parse can be applied in any order
//! without translating coordinates. Once the text has changed shape,
//! [`EditIndex::stratify`] folds the edits into a fresh index whose offsets
//! match the next parse.

use std::fmt;
use std::ops::{Add, Range};
use std::sync::Arc;

// -----------------------------------------------------------------------------
// Tagged source
// -----------------------------------------------------------------------------

/// One character together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// Byte offset in the original cell text, `None` for synthesized text.
    pub offset: Option<usize>,
    pub file: Option<Arc<str>>,
}

impl Cell {
    pub fn is_synthetic(&self) -> bool {
        self.offset.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    cells: Vec<Cell>,
}

impl Source {
    /// Tags every character of `text` with its byte offset and `file`.
    pub fn tagged(text: &str, file: Option<&str>) -> Self {
        let file: Option<Arc<str>> = file.map(Arc::from);
        let cells = text
            .char_indices()
            .map(|(offset, ch)| Cell {
                ch,
                offset: Some(offset),
                file: file.clone(),
            })
            .collect();
        Source { cells }
    }

    /// Text inserted by a rewrite; none of its characters have an origin.
    pub fn synthetic(text: &str) -> Self {
        let cells = text
            .chars()
            .map(|ch| Cell {
                ch,
                offset: None,
                file: None,
            })
            .collect();
        Source { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of characters (not bytes).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Byte length of the text this source spells.
    pub fn byte_len(&self) -> usize {
        self.cells.iter().map(|c| c.ch.len_utf8()).sum()
    }

    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }

    pub fn push(&mut self, other: impl Into<Source>) {
        self.cells.extend(other.into().cells);
    }

    /// Original offset of the first character that has one.
    pub fn first_origin(&self) -> Option<usize> {
        self.cells.iter().find_map(|c| c.offset)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for cell in &self.cells {
            f.write_char(cell.ch)?;
        }
        Ok(())
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::synthetic(text)
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::synthetic(&text)
    }
}

impl From<&String> for Source {
    fn from(text: &String) -> Self {
        Source::synthetic(text)
    }
}

impl FromIterator<Cell> for Source {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Source {
            cells: iter.into_iter().collect(),
        }
    }
}

impl<T: Into<Source>> Add<T> for Source {
    type Output = Source;

    fn add(mut self, rhs: T) -> Source {
        self.push(rhs);
        self
    }
}

// -----------------------------------------------------------------------------
// Edit nodes
// -----------------------------------------------------------------------------

/// The replaceable fragment standing in for one byte position.
#[derive(Debug, Clone, Default)]
pub struct EditNode {
    current: Source,
}

impl EditNode {
    pub fn current(&self) -> &Source {
        &self.current
    }

    pub fn prepend(&mut self, text: impl Into<Source>) {
        let mut head = text.into();
        head.cells.append(&mut self.current.cells);
        self.current = head;
    }

    pub fn append(&mut self, text: impl Into<Source>) {
        self.current.push(text);
    }

    pub fn replace(&mut self, text: impl Into<Source>) {
        self.current = text.into();
    }

    pub fn clear(&mut self) {
        self.current.cells.clear();
    }
}

// -----------------------------------------------------------------------------
// Edit index
// -----------------------------------------------------------------------------

/// Ordered edit nodes, one per byte of the text that was last parsed.
///
/// All ranges are half-open byte ranges of that text. Addressing a position
/// outside `0..len()` panics: offsets always come from a parse of the very
/// text this index was built from.
#[derive(Debug, Clone, Default)]
pub struct EditIndex {
    nodes: Vec<EditNode>,
}

impl EditIndex {
    pub fn new(source: Source) -> Self {
        let mut nodes = Vec::with_capacity(source.byte_len());
        for cell in source.cells {
            let width = cell.ch.len_utf8();
            nodes.push(EditNode {
                current: Source { cells: vec![cell] },
            });
            // Continuation bytes keep their slot so parser offsets line up.
            nodes.extend((1..width).map(|_| EditNode::default()));
        }
        EditIndex { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, at: usize) -> &EditNode {
        &self.nodes[at]
    }

    /// Collapses `range` into `text`: the first node takes `text`, the rest
    /// are cleared.
    pub fn replace(&mut self, range: Range<usize>, text: impl Into<Source>) {
        self.check(&range);
        self.nodes[range.start].replace(text);
        for node in self.nodes.iter_mut().take(range.end).skip(range.start + 1) {
            node.clear();
        }
    }

    /// Inserts `text` before the first position of `range`.
    pub fn prepend(&mut self, range: Range<usize>, text: impl Into<Source>) {
        self.check(&range);
        self.nodes[range.start].prepend(text);
    }

    /// Inserts `text` after the last position of `range`.
    pub fn append(&mut self, range: Range<usize>, text: impl Into<Source>) {
        self.check(&range);
        assert!(range.end > range.start, "append needs a non-empty range, got {range:?}");
        self.nodes[range.end - 1].append(text);
    }

    /// The current fragments of `range`, tags included.
    pub fn slice(&self, range: Range<usize>) -> Source {
        self.nodes[range]
            .iter()
            .flat_map(|n| n.current.cells.iter().cloned())
            .collect()
    }

    pub fn source(&self) -> Source {
        self.slice(0..self.nodes.len())
    }

    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len());
        for node in &self.nodes {
            out.extend(node.current.cells.iter().map(|c| c.ch));
        }
        out
    }

    /// Folds every pending edit into the text and rebuilds the index from it,
    /// so offsets from a parse of [`EditIndex::text`] address it again.
    pub fn stratify(&mut self) {
        let source = self.source();
        *self = EditIndex::new(source);
    }

    /// Original cell offset behind a position of the current text, looking
    /// backwards past synthesized text.
    pub fn origin_near(&self, at: usize) -> Option<usize> {
        let at = at.min(self.nodes.len().checked_sub(1)?);
        self.nodes[..=at]
            .iter()
            .rev()
            .find_map(|n| n.current.first_origin())
    }

    fn check(&self, range: &Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.nodes.len() && range.start < self.nodes.len(),
            "edit range {range:?} outside index of length {}",
            self.nodes.len()
        );
    }
}

impl From<Source> for EditIndex {
    fn from(source: Source) -> Self {
        EditIndex::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_source_records_byte_offsets_and_file() {
        let src = Source::tagged("aé b", Some("cell.js"));
        let offsets: Vec<_> = src.cells().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![Some(0), Some(1), Some(3), Some(4)]);
        assert!(src.cells().iter().all(|c| c.file.as_deref() == Some("cell.js")));
        assert_eq!(src.byte_len(), 5);
    }

    #[test]
    fn plain_text_converts_to_synthetic_source() {
        let src: Source = "x.".into();
        assert!(src.cells().iter().all(Cell::is_synthetic));
        let again: Source = src.clone().into();
        assert_eq!(again, src);
    }

    #[test]
    fn edits_address_original_positions() {
        let mut index = EditIndex::new(Source::tagged("let x = 1;", None));
        // Apply in reverse order; positions must not drift.
        index.append(8..9, ")");
        index.prepend(8..9, "(");
        index.prepend(4..5, "G.");
        index.replace(0..3, "void (");
        assert_eq!(index.text(), "void ( G.x = (1);");
        assert_eq!(index.len(), 10);
    }

    #[test]
    fn replace_clears_the_rest_of_the_range() {
        let mut index = EditIndex::new(Source::tagged("import 'm';", None));
        index.replace(0..11, "await I('m');");
        assert_eq!(index.text(), "await I('m');");
        assert!(index.node(5).current().is_empty());
    }

    #[test]
    fn prepend_and_append_stack_outwards() {
        let mut index = EditIndex::new(Source::tagged("x", None));
        index.prepend(0..1, "G.");
        index.prepend(0..1, "(");
        index.append(0..1, " = undefined");
        index.append(0..1, ")");
        assert_eq!(index.text(), "(G.x = undefined)");
    }

    #[test]
    fn stratify_rebuilds_over_the_edited_text() {
        let mut index = EditIndex::new(Source::tagged("ab", None));
        index.prepend(1..2, "__");
        index.stratify();
        assert_eq!(index.len(), 4);
        assert_eq!(index.text(), "a__b");
        index.replace(1..3, "-");
        assert_eq!(index.text(), "a-b");
        // Tags survive the rebuild.
        assert_eq!(index.node(3).current().cells()[0].offset, Some(1));
        assert_eq!(index.node(1).current().cells()[0].offset, None);
    }

    #[test]
    fn multibyte_characters_keep_parser_offsets() {
        let mut index = EditIndex::new(Source::tagged("é=1", None));
        assert_eq!(index.len(), 4);
        index.prepend(2..3, " ");
        index.append(0..2, "!");
        assert_eq!(index.text(), "é! =1");
    }

    #[test]
    fn slice_keeps_tags() {
        let index = EditIndex::new(Source::synthetic("f(") + Source::tagged("'m'", None) + ")");
        let slice = index.slice(2..5);
        assert_eq!(slice.text(), "'m'");
        assert_eq!(slice.first_origin(), Some(0));
    }

    #[test]
    fn origin_near_skips_synthetic_text() {
        let index = EditIndex::new(Source::tagged("ab", None) + "xyz");
        assert_eq!(index.origin_near(4), Some(1));
        assert_eq!(index.origin_near(100), Some(1));
        assert_eq!(EditIndex::default().origin_near(0), None);
    }

    #[test]
    #[should_panic]
    fn out_of_range_edit_is_fatal() {
        let mut index = EditIndex::new(Source::tagged("ab", None));
        index.replace(1..5, "c");
    }
}
