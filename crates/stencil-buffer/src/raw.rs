//! Plain, serialisable form of a [`ContentModel`].
//!
//! ## Learning: Validate at the Boundary
//!
//! `to_raw` can never fail, but `from_raw` accepts data from outside
//! the type system. It re-checks every model invariant before handing
//! back a `ContentModel`, so the rest of the crate can keep trusting
//! them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::block::TextBlock;
use crate::{BlockId, BufferError, BufferResult, ContentModel, Entity, EntityId};

/// A whole document as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContent {
    pub blocks: Vec<RawBlock>,
    pub entities: Vec<Entity>,
    /// Next id the registry will hand out
    #[serde(default)]
    pub next_entity_id: u64,
}

/// A block as plain text plus its entity runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub key: BlockId,
    pub text: String,
    #[serde(default)]
    pub entity_ranges: Vec<RawEntityRange>,
}

/// One entity run, in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntityRange {
    pub offset: usize,
    pub length: usize,
    pub entity: EntityId,
}

impl ContentModel {
    /// Converts the document to its plain representation.
    pub fn to_raw(&self) -> RawContent {
        let blocks = self
            .blocks()
            .map(|block| RawBlock {
                key: block.id(),
                text: block.text().into_owned(),
                entity_ranges: block
                    .entity_spans()
                    .into_iter()
                    .map(|span| RawEntityRange {
                        offset: span.start,
                        length: span.len(),
                        entity: span.entity,
                    })
                    .collect(),
            })
            .collect();

        RawContent {
            blocks,
            entities: self.entities().cloned().collect(),
            next_entity_id: self.next_entity_id(),
        }
    }

    /// Rebuilds a document, rejecting anything that breaks an invariant.
    pub fn from_raw(raw: &RawContent) -> BufferResult<Self> {
        if raw.blocks.is_empty() {
            return Err(invalid("document has no blocks"));
        }

        let mut registry = BTreeMap::new();
        for entity in &raw.entities {
            if registry.insert(entity.id, entity.clone()).is_some() {
                return Err(invalid(format!("entity {} registered twice", entity.id)));
            }
        }

        let mut keys = HashSet::new();
        let mut blocks = Vec::with_capacity(raw.blocks.len());
        for raw_block in &raw.blocks {
            if !keys.insert(raw_block.key) {
                return Err(invalid(format!("duplicate block key {}", raw_block.key)));
            }
            if raw_block.text.contains(['\n', '\r']) {
                return Err(invalid(format!("block {} contains a line break", raw_block.key)));
            }
            blocks.push(rebuild_block(raw_block, &registry)?);
        }

        // One contiguous run per entity across the whole document
        let mut seen = HashSet::new();
        for block in &blocks {
            for span in block.entity_spans() {
                if !seen.insert(span.entity) {
                    return Err(invalid(format!("entity {} is split", span.entity)));
                }
            }
        }

        let floor = registry.keys().last().map_or(1, |id: &EntityId| id.get() + 1);
        let next_entity_id = raw.next_entity_id.max(floor);
        Ok(ContentModel::from_blocks(blocks).with_registry(registry, next_entity_id))
    }
}

fn rebuild_block(raw: &RawBlock, registry: &BTreeMap<EntityId, Entity>) -> BufferResult<TextBlock> {
    let len = raw.text.chars().count();
    let mut overlay = vec![None; len];

    for range in &raw.entity_ranges {
        if !registry.contains_key(&range.entity) {
            return Err(BufferError::UnknownEntity(range.entity));
        }
        let end = range
            .offset
            .checked_add(range.length)
            .filter(|&end| range.length > 0 && end <= len)
            .ok_or_else(|| {
                invalid(format!(
                    "range at {} of length {} for {} is outside block {}",
                    range.offset, range.length, range.entity, raw.key
                ))
            })?;
        for slot in &mut overlay[range.offset..end] {
            if slot.is_some() {
                return Err(invalid(format!("overlapping ranges in block {}", raw.key)));
            }
            *slot = Some(range.entity);
        }
    }

    Ok(TextBlock::from_parts(raw.key, &raw.text, overlay))
}

fn invalid(reason: impl Into<String>) -> BufferError {
    BufferError::InvalidRaw(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityData, EntityKind, SelectionRange};

    fn sample() -> ContentModel {
        let content = ContentModel::from_text("hello world\nsecond");
        let block = content.first_block().id();
        let (content, id) = content.create_entity(EntityKind::Highlight, EntityData::default());
        content
            .apply_entity(&SelectionRange::new(block, 0, 6), Some(id))
            .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_model() {
        let content = sample();
        let rebuilt = ContentModel::from_raw(&content.to_raw()).unwrap();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn test_round_trip_through_json() {
        let content = sample();
        let json = serde_json::to_string(&content.to_raw()).unwrap();
        let raw: RawContent = serde_json::from_str(&json).unwrap();
        assert_eq!(ContentModel::from_raw(&raw).unwrap(), content);
    }

    #[test]
    fn test_rejects_unknown_entity() {
        let mut raw = sample().to_raw();
        raw.entities.clear();
        assert!(matches!(
            ContentModel::from_raw(&raw),
            Err(BufferError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_rejects_split_entity() {
        let mut raw = sample().to_raw();
        let range = raw.blocks[0].entity_ranges[0];
        raw.blocks[1].entity_ranges.push(RawEntityRange {
            offset: 0,
            length: 2,
            entity: range.entity,
        });
        assert!(matches!(
            ContentModel::from_raw(&raw),
            Err(BufferError::InvalidRaw(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_bounds_range() {
        let mut raw = sample().to_raw();
        raw.blocks[1].entity_ranges.push(RawEntityRange {
            offset: 4,
            length: 9,
            entity: raw.entities[0].id,
        });
        assert!(ContentModel::from_raw(&raw).is_err());
    }

    #[test]
    fn test_rejects_overflowing_range() {
        let mut raw = sample().to_raw();
        raw.blocks[1].entity_ranges.push(RawEntityRange {
            offset: usize::MAX,
            length: 2,
            entity: raw.entities[0].id,
        });
        assert!(matches!(
            ContentModel::from_raw(&raw),
            Err(BufferError::InvalidRaw(_))
        ));
    }

    #[test]
    fn test_rejects_empty_range() {
        let mut raw = sample().to_raw();
        raw.blocks[0].entity_ranges[0].length = 0;
        assert!(matches!(
            ContentModel::from_raw(&raw),
            Err(BufferError::InvalidRaw(_))
        ));
    }
}
