//! Data handed to the rendering layer.
//!
//! The core never draws anything. It describes each block as a list of
//! segments (plain text or entity runs) and remembers where the
//! renderer last drew each entity, so popups can be placed next to it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use stencil_buffer::{BlockId, ContentModel, EntityId, EntityKind, TextBlock};

/// A screen rectangle reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the same rectangle moved down by `dy`.
    pub fn offset_y(&self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..*self
        }
    }
}

/// Last known screen position of each rendered entity.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    positions: HashMap<(BlockId, EntityId), Rect>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records where an entity was drawn, replacing any older position.
    pub fn insert(&mut self, block: BlockId, entity: EntityId, rect: Rect) {
        self.positions.insert((block, entity), rect);
    }

    pub fn get(&self, block: BlockId, entity: EntityId) -> Option<Rect> {
        self.positions.get(&(block, entity)).copied()
    }

    /// Forgets positions of entities that no longer have a run in their block.
    pub fn retain_live(&mut self, content: &ContentModel) {
        self.positions.retain(|(block, entity), _| {
            content
                .block(*block)
                .is_some_and(|b| b.references(*entity))
        });
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(BlockId, EntityId), &Rect)> {
        self.positions.iter()
    }
}

/// A piece of a block: either plain text or one entity run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub range: Range<usize>,
    pub text: String,
    pub entity: Option<(EntityId, EntityKind)>,
}

/// One block split into segments covering all of its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDecoration {
    pub block: BlockId,
    pub segments: Vec<Segment>,
}

impl BlockDecoration {
    /// Text with parameters wrapped in `{}` and highlights in `[]`.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment.entity {
                Some((_, EntityKind::Parameter)) => {
                    out.push('{');
                    out.push_str(&segment.text);
                    out.push('}');
                }
                Some((_, EntityKind::Highlight)) => {
                    out.push('[');
                    out.push_str(&segment.text);
                    out.push(']');
                }
                None => out.push_str(&segment.text),
            }
        }
        out
    }
}

/// Decorates every block of the document.
pub fn decorate(content: &ContentModel) -> Vec<BlockDecoration> {
    content
        .blocks()
        .map(|block| decorate_block(content, block))
        .collect()
}

/// Splits one block into plain and entity segments.
pub fn decorate_block(content: &ContentModel, block: &TextBlock) -> BlockDecoration {
    let mut segments = Vec::new();
    let mut push = |range: Range<usize>, entity: Option<(EntityId, EntityKind)>| {
        if range.is_empty() {
            return;
        }
        let text = block
            .slice(range.clone())
            .map(|s| s.into_owned())
            .unwrap_or_default();
        segments.push(Segment {
            range,
            text,
            entity,
        });
    };

    let mut cursor = 0;
    for span in content.entities_in_block(block.id()) {
        push(cursor..span.start, None);
        let kind = content.entity(span.entity).map(|e| e.kind);
        push(span.range(), kind.map(|kind| (span.entity, kind)));
        cursor = span.end;
    }
    push(cursor..block.len_chars(), None);

    BlockDecoration {
        block: block.id(),
        segments,
    }
}
