//! The versioned document model.
//!
//! ## Learning: Persistent Values
//!
//! Every operation takes `&self` and returns a brand new
//! `ContentModel`. Blocks sit behind `Arc`, so a new version only
//! copies the blocks it actually touches (`Arc::make_mut`), and anyone
//! still holding an older version keeps seeing exactly what they had.
//!
//! ```rust,ignore
//! let v1 = ContentModel::from_text("hello");
//! let v2 = v1.insert_text(caret, "!", None)?;
//! assert_eq!(v1.plain_text(), "hello"); // untouched
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::block::{EntitySpan, TextBlock};
use crate::{
    BlockId, BufferError, BufferResult, Entity, EntityData, EntityId, EntityKind, SelectionRange,
};

/// An ordered list of blocks plus the registry of entities they reference.
///
/// # Invariants
///
/// - There is always at least one block
/// - Every id in a block overlay exists in the registry
/// - Each entity occupies at most one contiguous run, in one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentModel {
    blocks: Vec<Arc<TextBlock>>,
    entities: Arc<BTreeMap<EntityId, Entity>>,
    next_entity_id: u64,
}

impl ContentModel {
    /// Creates a document with a single empty block.
    pub fn new() -> Self {
        Self::from_blocks(vec![TextBlock::new(BlockId::new())])
    }

    /// Creates a document from plain text, one block per line.
    pub fn from_text(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|line| TextBlock::with_text(BlockId::new(), line.trim_end_matches('\r')))
            .collect();
        Self::from_blocks(blocks)
    }

    pub(crate) fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        Self {
            blocks: blocks.into_iter().map(Arc::new).collect(),
            entities: Arc::new(BTreeMap::new()),
            next_entity_id: 1,
        }
    }

    pub(crate) fn with_registry(
        mut self,
        entities: BTreeMap<EntityId, Entity>,
        next_entity_id: u64,
    ) -> Self {
        self.entities = Arc::new(entities);
        self.next_entity_id = next_entity_id;
        self
    }

    // ==================== Blocks ====================

    /// Iterates over blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().map(|block| block.as_ref())
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, id: BlockId) -> Option<&TextBlock> {
        self.blocks
            .iter()
            .find(|block| block.id() == id)
            .map(|block| block.as_ref())
    }

    /// Returns the block at a document position.
    pub fn block_at(&self, index: usize) -> Option<&TextBlock> {
        self.blocks.get(index).map(|block| block.as_ref())
    }

    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id() == id)
    }

    pub fn first_block(&self) -> &TextBlock {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &TextBlock {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Returns the block following `id`, if any.
    pub fn block_after(&self, id: BlockId) -> Option<&TextBlock> {
        let index = self.block_index(id)?;
        self.block_at(index + 1)
    }

    // ==================== Text ====================

    /// Returns the whole document, blocks joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.blocks()
            .map(|block| block.text().into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn block_text(&self, id: BlockId) -> BufferResult<String> {
        Ok(self.require_block(id)?.text().into_owned())
    }

    /// Returns the text covered by a selection.
    pub fn selected_text(&self, selection: &SelectionRange) -> BufferResult<String> {
        let block = self.require_block(selection.block)?;
        Ok(block.slice(selection.range())?.into_owned())
    }

    /// Returns true if `selection` points at an existing block and stays
    /// within its bounds.
    pub fn is_valid_selection(&self, selection: &SelectionRange) -> bool {
        self.block(selection.block)
            .is_some_and(|block| selection.end() <= block.len_chars())
    }

    // ==================== Entities ====================

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Iterates over the registry in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the entity at a character offset of a block.
    pub fn entity_at(&self, block: BlockId, offset: usize) -> Option<EntityId> {
        self.block(block)?.entity_at(offset)
    }

    /// Returns the full run of `entity` inside `block`.
    pub fn entity_range(&self, block: BlockId, entity: EntityId) -> Option<SelectionRange> {
        let range = self.block(block)?.entity_range(entity)?;
        Some(SelectionRange::from_range(block, range))
    }

    /// Lists the entity runs of a block; empty for unknown blocks.
    pub fn entities_in_block(&self, block: BlockId) -> Vec<EntitySpan> {
        self.block(block)
            .map(TextBlock::entity_spans)
            .unwrap_or_default()
    }

    // ==================== Edits ====================

    /// Inserts text at the selection, replacing it if non-collapsed.
    ///
    /// Without an explicit `entity`, new characters join an entity only
    /// when inserted strictly inside its run. An explicit id is always
    /// assigned.
    pub fn insert_text(
        &self,
        selection: &SelectionRange,
        text: &str,
        entity: Option<EntityId>,
    ) -> BufferResult<Self> {
        if text.contains(['\n', '\r']) {
            return Err(BufferError::LineBreakInText);
        }

        let mut next = if selection.is_collapsed() {
            self.clone()
        } else {
            self.delete_range(selection)?
        };

        let offset = selection.start();
        let entity = match entity {
            Some(id) => Some(next.require_entity(id)?.id),
            None => next
                .require_block(selection.block)?
                .entity_surrounding(offset),
        };

        next.block_mut(selection.block)?
            .insert(offset, text, entity)?;
        Ok(next)
    }

    /// Removes the characters covered by the selection.
    ///
    /// Orphaned registry entries are left alone; see
    /// [`prune_entities`](Self::prune_entities).
    pub fn delete_range(&self, selection: &SelectionRange) -> BufferResult<Self> {
        let mut next = self.clone();
        next.block_mut(selection.block)?.remove(selection.range())?;
        Ok(next)
    }

    /// Overwrites the entity overlay of the selection (`None` clears it).
    pub fn apply_entity(
        &self,
        selection: &SelectionRange,
        entity: Option<EntityId>,
    ) -> BufferResult<Self> {
        if let Some(id) = entity {
            self.require_entity(id)?;
        }
        let mut next = self.clone();
        next.block_mut(selection.block)?
            .set_entity(selection.range(), entity)?;
        Ok(next)
    }

    /// Registers a new entity. The id is not attached to any text yet.
    pub fn create_entity(&self, kind: EntityKind, data: EntityData) -> (Self, EntityId) {
        let mut next = self.clone();
        let id = EntityId::new(next.next_entity_id);
        next.next_entity_id += 1;
        Arc::make_mut(&mut next.entities).insert(id, Entity::new(id, kind, data));
        (next, id)
    }

    /// Drops registry entries that no block references anymore.
    pub fn prune_entities(&self) -> Self {
        let live: std::collections::BTreeSet<EntityId> = self
            .blocks()
            .flat_map(|block| block.referenced_entities())
            .collect();

        if self.entities.keys().all(|id| live.contains(id)) {
            return self.clone();
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.entities).retain(|id, _| live.contains(id));
        next
    }

    /// Splits a block in two at `offset` and returns the new block's id.
    ///
    /// Refused when `offset` falls strictly inside an entity run, so an
    /// entity never ends up spread across blocks.
    pub fn split_block(&self, block: BlockId, offset: usize) -> BufferResult<(Self, BlockId)> {
        let index = self.block_index(block).ok_or(BufferError::UnknownBlock(block))?;
        if let Some(entity) = self.blocks[index].entity_surrounding(offset) {
            return Err(BufferError::SplitInsideEntity { block, entity });
        }

        let mut next = self.clone();
        let new_id = BlockId::new();
        let tail = Arc::make_mut(&mut next.blocks[index]).split_off(offset, new_id)?;
        next.blocks.insert(index + 1, Arc::new(tail));
        Ok((next, new_id))
    }

    /// Merges `block` into the block before it.
    ///
    /// Returns the new content and a caret at the join point.
    pub fn join_with_previous(&self, block: BlockId) -> BufferResult<(Self, SelectionRange)> {
        let index = self.block_index(block).ok_or(BufferError::UnknownBlock(block))?;
        if index == 0 {
            return Err(BufferError::NoBlockBefore(block));
        }

        let mut next = self.clone();
        let removed = next.blocks.remove(index);
        let previous = Arc::make_mut(&mut next.blocks[index - 1]);
        let caret = SelectionRange::caret(previous.id(), previous.len_chars());
        previous.append(&removed);
        Ok((next, caret))
    }

    // ==================== Helpers ====================

    fn require_block(&self, id: BlockId) -> BufferResult<&TextBlock> {
        self.block(id).ok_or(BufferError::UnknownBlock(id))
    }

    fn require_entity(&self, id: EntityId) -> BufferResult<&Entity> {
        self.entities.get(&id).ok_or(BufferError::UnknownEntity(id))
    }

    fn block_mut(&mut self, id: BlockId) -> BufferResult<&mut TextBlock> {
        self.blocks
            .iter_mut()
            .find(|block| block.id() == id)
            .map(Arc::make_mut)
            .ok_or(BufferError::UnknownBlock(id))
    }

    pub(crate) fn next_entity_id(&self) -> u64 {
        self.next_entity_id
    }
}

impl Default for ContentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ContentModel {
    fn from(s: &str) -> Self {
        Self::from_text(s)
    }
}
