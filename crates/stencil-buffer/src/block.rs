//! A single line of text with a parallel entity overlay.
//!
//! ## Why Rope?
//!
//! Each block keeps its text in a rope so that:
//! - **Cloning is cheap**: rope nodes are shared, which matters because
//!   every edit produces a new document version
//! - **Char indexing is native**: offsets are chars, never bytes
//!
//! The overlay is a plain `Vec` with one slot per char. A run of equal
//! `Some(id)` slots is one entity span.

use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;
use uuid::Uuid;

use crate::{BufferError, BufferResult, EntityId};

/// Unique identifier for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    /// Creates a new unique block ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell blocks apart in logs
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// A maximal run of one entity inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub entity: EntityId,
}

impl EntitySpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One line of the document.
///
/// Blocks are only mutated through [`ContentModel`](crate::ContentModel)
/// operations; the mutators here are crate-private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    id: BlockId,
    text: Rope,
    entities: Vec<Option<EntityId>>,
}

impl TextBlock {
    /// Creates an empty block.
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            text: Rope::new(),
            entities: Vec::new(),
        }
    }

    /// Creates a block holding plain text with no entities.
    pub fn with_text(id: BlockId, text: &str) -> Self {
        let text = Rope::from_str(text);
        let entities = vec![None; text.len_chars()];
        Self { id, text, entities }
    }

    // ==================== Access ====================

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the block text.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.text.slice(..).into()
    }

    /// Number of characters in the block.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    /// Returns the character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get_char(offset)
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        self.check_range(&range)?;
        Ok(self.text.slice(range).into())
    }

    /// Returns the entity covering the character at `offset`.
    pub fn entity_at(&self, offset: usize) -> Option<EntityId> {
        self.entities.get(offset).copied().flatten()
    }

    /// Returns the entity whose run strictly surrounds the gap at
    /// `offset`, i.e. both neighbouring characters belong to it.
    pub fn entity_surrounding(&self, offset: usize) -> Option<EntityId> {
        if offset == 0 {
            return None;
        }
        let before = self.entity_at(offset - 1)?;
        (self.entity_at(offset) == Some(before)).then_some(before)
    }

    /// Lists every maximal entity run, left to right.
    pub fn entity_spans(&self) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut current: Option<EntitySpan> = None;

        for (offset, slot) in self.entities.iter().enumerate() {
            if let (Some(span), Some(id)) = (current.as_mut(), slot) {
                if span.entity == *id {
                    span.end = offset + 1;
                    continue;
                }
            }
            spans.extend(current.take());
            current = slot.map(|entity| EntitySpan {
                start: offset,
                end: offset + 1,
                entity,
            });
        }

        spans.extend(current);
        spans
    }

    /// Returns the first maximal run of `entity`.
    pub fn entity_range(&self, entity: EntityId) -> Option<Range<usize>> {
        let start = self.entities.iter().position(|slot| *slot == Some(entity))?;
        let len = self.entities[start..]
            .iter()
            .take_while(|slot| **slot == Some(entity))
            .count();
        Some(start..start + len)
    }

    /// Returns true if any character references `entity`.
    pub fn references(&self, entity: EntityId) -> bool {
        self.entities.contains(&Some(entity))
    }

    /// Iterates over every referenced entity id (with repeats).
    pub fn referenced_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().filter_map(|slot| *slot)
    }

    // ==================== Mutations ====================

    /// Inserts `text` at `offset`, assigning every new char `entity`.
    pub(crate) fn insert(
        &mut self,
        offset: usize,
        text: &str,
        entity: Option<EntityId>,
    ) -> BufferResult<()> {
        self.check_offset(offset)?;
        let count = text.chars().count();
        self.text.insert(offset, text);
        self.entities
            .splice(offset..offset, std::iter::repeat_n(entity, count));
        Ok(())
    }

    /// Removes the characters in `range` together with their overlay slots.
    pub(crate) fn remove(&mut self, range: Range<usize>) -> BufferResult<()> {
        self.check_range(&range)?;
        self.text.remove(range.clone());
        self.entities.drain(range);
        Ok(())
    }

    /// Overwrites the overlay for `range` without touching the text.
    pub(crate) fn set_entity(
        &mut self,
        range: Range<usize>,
        entity: Option<EntityId>,
    ) -> BufferResult<()> {
        self.check_range(&range)?;
        self.entities[range].fill(entity);
        Ok(())
    }

    /// Splits the block at `offset`; the tail moves into a new block.
    pub(crate) fn split_off(&mut self, offset: usize, new_id: BlockId) -> BufferResult<TextBlock> {
        self.check_offset(offset)?;
        let text = self.text.split_off(offset);
        let entities = self.entities.split_off(offset);
        Ok(TextBlock {
            id: new_id,
            text,
            entities,
        })
    }

    /// Appends another block's content to the end of this one.
    pub(crate) fn append(&mut self, other: &TextBlock) {
        self.text.append(other.text.clone());
        self.entities.extend_from_slice(&other.entities);
    }

    /// Rebuilds a block from already-validated parts.
    pub(crate) fn from_parts(id: BlockId, text: &str, entities: Vec<Option<EntityId>>) -> Self {
        Self {
            id,
            text: Rope::from_str(text),
            entities,
        }
    }

    // ==================== Bounds ====================

    fn check_offset(&self, offset: usize) -> BufferResult<()> {
        if offset > self.len_chars() {
            return Err(BufferError::OffsetOutOfBounds {
                block: self.id,
                offset,
                len: self.len_chars(),
            });
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> BufferResult<()> {
        if range.start > range.end {
            return Err(BufferError::OffsetOutOfBounds {
                block: self.id,
                offset: range.start,
                len: range.end,
            });
        }
        self.check_offset(range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(text: &str, runs: &[(Range<usize>, u64)]) -> TextBlock {
        let mut block = TextBlock::with_text(BlockId::new(), text);
        for (range, id) in runs {
            block
                .set_entity(range.clone(), Some(EntityId::new(*id)))
                .unwrap();
        }
        block
    }

    #[test]
    fn test_with_text_has_empty_overlay() {
        let block = TextBlock::with_text(BlockId::new(), "héllo");
        assert_eq!(block.len_chars(), 5);
        assert_eq!(block.char_at(1), Some('é'));
        assert!(block.entity_spans().is_empty());
    }

    #[test]
    fn test_entity_spans_split_on_id_change() {
        let block = block_with("ab cd ef", &[(0..3, 1), (3..6, 2)]);
        let spans = block.entity_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range(), 0..3);
        assert_eq!(spans[1].range(), 3..6);
        assert_eq!(spans[1].entity, EntityId::new(2));
    }

    #[test]
    fn test_entity_range_and_surrounding() {
        let block = block_with("x$foo y", &[(1..6, 7)]);
        let id = EntityId::new(7);
        assert_eq!(block.entity_range(id), Some(1..6));
        assert_eq!(block.entity_surrounding(3), Some(id));
        // Boundaries are not "inside"
        assert_eq!(block.entity_surrounding(1), None);
        assert_eq!(block.entity_surrounding(6), None);
    }

    #[test]
    fn test_insert_shifts_overlay() {
        let mut block = block_with("ab ", &[(0..3, 1)]);
        block.insert(0, "zz", None).unwrap();
        assert_eq!(block.text(), "zzab ");
        assert_eq!(block.entity_range(EntityId::new(1)), Some(2..5));
    }

    #[test]
    fn test_remove_drops_overlay_slots() {
        let mut block = block_with("hello world", &[(6..11, 3)]);
        block.remove(0..6).unwrap();
        assert_eq!(block.text(), "world");
        assert_eq!(block.entity_range(EntityId::new(3)), Some(0..5));
    }

    #[test]
    fn test_out_of_bounds_is_error() {
        let mut block = TextBlock::with_text(BlockId::new(), "abc");
        assert!(matches!(
            block.insert(4, "x", None),
            Err(BufferError::OffsetOutOfBounds { offset: 4, len: 3, .. })
        ));
        assert!(block.remove(2..5).is_err());
    }

    #[test]
    fn test_split_and_append() {
        let mut block = block_with("ab cd", &[(3..5, 1)]);
        let tail = block.split_off(3, BlockId::new()).unwrap();
        assert_eq!(block.text(), "ab ");
        assert_eq!(tail.text(), "cd");
        assert_eq!(tail.entity_range(EntityId::new(1)), Some(0..2));

        block.append(&tail);
        assert_eq!(block.text(), "ab cd");
        assert_eq!(block.entity_range(EntityId::new(1)), Some(3..5));
    }
}
