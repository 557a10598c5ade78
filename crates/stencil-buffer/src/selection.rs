//! Intra-block selection ranges.
//!
//! ## Learning: Range Types
//!
//! Offsets are exclusive at the end, like `Range<usize>`:
//! - Collapsed selections (caret, start == end) are natural
//! - Length is `end - start`
//! - Converts directly into slice/rope ranges

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::BlockId;

/// A selection inside a single block.
///
/// `anchor` is where the selection started and `focus` is where the
/// caret currently is, so a backward selection has `focus < anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    /// Block the selection lives in
    pub block: BlockId,
    /// Offset where the selection started
    pub anchor: usize,
    /// Offset of the caret
    pub focus: usize,
}

impl SelectionRange {
    /// Creates a selection spanning within a single block.
    pub fn new(block: BlockId, anchor: usize, focus: usize) -> Self {
        Self {
            block,
            anchor,
            focus,
        }
    }

    /// Creates a collapsed selection located at a single point.
    pub fn caret(block: BlockId, offset: usize) -> Self {
        Self::new(block, offset, offset)
    }

    /// Creates a forward selection covering `range`.
    pub fn from_range(block: BlockId, range: Range<usize>) -> Self {
        Self::new(block, range.start, range.end)
    }

    /// Returns true if this is a zero-width selection (just a caret).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Returns true if the focus sits before the anchor.
    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// Normalized start offset.
    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    /// Normalized end offset (exclusive).
    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Same as [`is_collapsed`](Self::is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Returns the normalized range.
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Returns true if `offset` lies within `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// Returns true if both selections share at least one character.
    pub fn overlaps(&self, other: &SelectionRange) -> bool {
        self.block == other.block && self.start() < other.end() && other.start() < self.end()
    }

    /// Collapses to the start offset.
    pub fn collapse_to_start(&self) -> Self {
        Self::caret(self.block, self.start())
    }

    /// Collapses to the end offset.
    pub fn collapse_to_end(&self) -> Self {
        Self::caret(self.block, self.end())
    }

    /// Clamps both offsets to `len`, keeping direction.
    pub fn clamp(&self, len: usize) -> Self {
        Self::new(self.block, self.anchor.min(len), self.focus.min(len))
    }
}
