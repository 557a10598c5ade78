//! # Stencil Core
//!
//! Entity lifecycle and edit dispatch for the template editor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Editor                            │
//! │  ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌─────────────┐ │
//! │  │  Config  │ │  Keymap  │ │ Variables │ │ RenderCache │ │
//! │  └──────────┘ └──────────┘ └───────────┘ └─────────────┘ │
//! │        │                                                  │
//! │  ┌─────┴──────────────────────────────────────┐          │
//! │  │  controller: (EditorState, event) -> next  │          │
//! │  │        └── entity: magic-space lifecycle   │          │
//! │  └────────────────────────────────────────────┘          │
//! │        │                                                  │
//! │  ┌─────┴─────┐                                            │
//! │  │ EventBus  │ ──► rendering collaborators                │
//! │  └───────────┘                                            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Pure Transitions behind a Facade
//!
//! `controller` and `entity` are plain functions from one
//! [`EditorState`] to the next, which keeps them easy to test.
//! [`Editor`] owns the current state and turns failures into logged
//! no-ops.

pub mod autocomplete;
pub mod command;
pub mod config;
pub mod controller;
pub mod editor;
pub mod entity;
pub mod event;
pub mod keymap;
pub mod render;
pub mod state;

pub use autocomplete::{Autocomplete, VariableSet};
pub use command::Command;
pub use config::Config;
pub use controller::{ContentEdit, Motion};
pub use editor::Editor;
pub use entity::ActiveParam;
pub use event::{EditorEvent, EventBus, EventHandler};
pub use keymap::{Key, KeyPress, Keymap, Modifiers};
pub use render::{BlockDecoration, Rect, RenderCache, Segment};
pub use state::EditorState;

use stencil_buffer::{BlockId, BufferError};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Selection {anchor}..{focus} is not valid in block {block}")]
    InvalidSelection {
        block: BlockId,
        anchor: usize,
        focus: usize,
    },

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}
