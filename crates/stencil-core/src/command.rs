//! Commands the editor can execute.
//!
//! ## Learning: The Command Pattern
//!
//! Commands turn actions into values:
//! - Key bindings map to them
//! - Toolbar buttons and the rendering layer send them
//! - They can be logged and replayed from a script

use stencil_buffer::{BlockId, EntityId};

use crate::CoreError;

/// Built-in editor commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Command {
    /// Insert a new `$` parameter at the selection
    Parameterize,
    /// Turn the current selection into a highlight
    Highlight,
    /// Remove an entity's characters by explicit span
    RemoveEntity {
        block: BlockId,
        start: usize,
        end: usize,
    },
    /// Remove an entity's whole run
    RemoveEntityById { block: BlockId, entity: EntityId },
    /// Replace the active parameter's name (autocomplete acceptance)
    ReplaceParam { text: String },
}

impl Command {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &str {
        match self {
            Command::Parameterize => "Add Field",
            Command::Highlight => "Highlight",
            Command::RemoveEntity { .. } => "Remove Entity",
            Command::RemoveEntityById { .. } => "Remove Entity",
            Command::ReplaceParam { .. } => "Replace Field",
        }
    }

    /// Parses an argument-free command name, as used in key bindings.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "parameterize" | "addfield" => Some(Command::Parameterize),
            "highlight" => Some(Command::Highlight),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownCommand(s.to_string()))
    }
}
