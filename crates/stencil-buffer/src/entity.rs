//! Entity identifiers and registry records.
//!
//! ## Learning: Newtype Pattern
//!
//! `EntityId` wraps a `u64` so an entity id can never be confused with
//! a character offset, even though both are plain integers underneath.

use serde::{Deserialize, Serialize};

/// Identifier of an entity in a [`ContentModel`](crate::ContentModel)
/// registry.
///
/// Ids come from a per-document counter and are never reused, even
/// after the entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of annotation an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A named template placeholder rendered as `$name`
    Parameter,
    /// Arbitrary selected text marked for emphasis
    Highlight,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Parameter => write!(f, "parameter"),
            EntityKind::Highlight => write!(f, "highlight"),
        }
    }
}

/// Payload attached to an entity.
///
/// Removal is requested through the editor directly, so nothing needs
/// to travel with the entity yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityData {}

/// A registry record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    #[serde(default)]
    pub data: EntityData,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, data: EntityData) -> Self {
        Self { id, kind, data }
    }

    pub fn is_parameter(&self) -> bool {
        self.kind == EntityKind::Parameter
    }
}
