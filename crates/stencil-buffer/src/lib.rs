//! # Stencil Buffer
//!
//! Block-structured text model where every character can point at an
//! entity (a parameter or a highlight).
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Values, not Objects
//! - `ContentModel` operations take `&self` and return a new version
//! - Old versions stay valid and unchanged (blocks are `Arc`-shared)
//!
//! ### Parallel Overlays
//! - Each `TextBlock` keeps one `Option<EntityId>` per character
//! - A run of the same id is one entity span
//! - Offsets are characters, never bytes

mod block;
mod content;
mod entity;
mod raw;
mod selection;

pub use block::{BlockId, EntitySpan, TextBlock};
pub use content::ContentModel;
pub use entity::{Entity, EntityData, EntityId, EntityKind};
pub use raw::{RawBlock, RawContent, RawEntityRange};
pub use selection::SelectionRange;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Block {0} does not exist")]
    UnknownBlock(BlockId),

    #[error("Offset {offset} is out of bounds for block {block} (length {len})")]
    OffsetOutOfBounds {
        block: BlockId,
        offset: usize,
        len: usize,
    },

    #[error("Entity {0} is not registered")]
    UnknownEntity(EntityId),

    #[error("Inserted text may not contain line breaks")]
    LineBreakInText,

    #[error("Cannot split block {block} inside entity {entity}")]
    SplitInsideEntity { block: BlockId, entity: EntityId },

    #[error("Block {0} is the first block")]
    NoBlockBefore(BlockId),

    #[error("Invalid raw content: {0}")]
    InvalidRaw(String),
}
