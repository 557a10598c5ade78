//! Top-level event dispatch as pure state transitions.
//!
//! Two kinds of input reach the editor surface:
//! - **Content edits** ([`ContentEdit`]): the document changed, so the
//!   entity runs are patched afterwards.
//! - **Selection changes**: the document is untouched, but a new
//!   selection may create a highlight, or a parameter if the `$` key
//!   triggered it.
//!
//! Explicit requests from the rendering layer arrive as [`Command`]s.

use stencil_buffer::{BlockId, ContentModel, SelectionRange};

use crate::command::Command;
use crate::entity::{
    highlight, parameterize, patch_entities, remove_entity, remove_entity_by_id, replace_param,
};
use crate::{CoreError, CoreResult, EditorState};

/// A raw edit at the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEdit {
    /// Type text, replacing a non-collapsed selection
    InsertText(String),
    /// Backspace
    DeleteBackward,
    /// Delete
    DeleteForward,
    /// Delete the selection, nothing when collapsed
    DeleteSelection,
    /// Enter
    SplitBlock,
}

/// Caret movements available from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Home,
    End,
}

// ==================== Content ====================

/// Applies a raw edit, then repairs the entity runs.
pub fn on_content_edit(state: &EditorState, edit: &ContentEdit) -> CoreResult<EditorState> {
    let selection = state.selection;
    let (content, selection) = apply_edit(&state.content, selection, edit)?;
    let content = patch_entities(&content)?;
    Ok(EditorState::new(content, selection).clamped())
}

fn apply_edit(
    content: &ContentModel,
    selection: SelectionRange,
    edit: &ContentEdit,
) -> CoreResult<(ContentModel, SelectionRange)> {
    let block = selection.block;
    let start = selection.start();

    let unchanged = || (content.clone(), selection);

    let result = match edit {
        ContentEdit::InsertText(text) => {
            let next = content.insert_text(&selection, text, None)?;
            (next, SelectionRange::caret(block, start + text.chars().count()))
        }
        _ if !selection.is_collapsed() && *edit != ContentEdit::SplitBlock => {
            let next = content.delete_range(&selection)?;
            (next, selection.collapse_to_start())
        }
        ContentEdit::DeleteSelection => unchanged(),
        ContentEdit::DeleteBackward if start == 0 => {
            if content.block_index(block) == Some(0) {
                unchanged()
            } else {
                content.join_with_previous(block)?
            }
        }
        ContentEdit::DeleteBackward => {
            let range = SelectionRange::new(block, start - 1, start);
            (content.delete_range(&range)?, range.collapse_to_start())
        }
        ContentEdit::DeleteForward => {
            let len = block_len(content, block)?;
            if start < len {
                let range = SelectionRange::new(block, start, start + 1);
                (content.delete_range(&range)?, selection)
            } else {
                match content.block_after(block) {
                    Some(next) => content.join_with_previous(next.id())?,
                    None => unchanged(),
                }
            }
        }
        ContentEdit::SplitBlock => {
            let content = if selection.is_collapsed() {
                content.clone()
            } else {
                content.delete_range(&selection)?
            };
            let (next, new_block) = content.split_block(block, start)?;
            (next, SelectionRange::caret(new_block, 0))
        }
    };

    Ok(result)
}

// ==================== Selection ====================

/// Accepts a new selection over unchanged content.
///
/// A non-collapsed selection with visible text becomes a highlight. A
/// collapsed one becomes a new parameter when `trigger` is the
/// parameterize command. Otherwise the selection is taken as is.
pub fn on_selection_change(
    state: &EditorState,
    selection: SelectionRange,
    trigger: Option<&Command>,
) -> CoreResult<EditorState> {
    if !state.content.is_valid_selection(&selection) {
        return Err(CoreError::InvalidSelection {
            block: selection.block,
            anchor: selection.anchor,
            focus: selection.focus,
        });
    }

    let next = state.with_selection(selection);
    if !selection.is_collapsed() {
        if next.selected_text().trim().is_empty() {
            return Ok(next);
        }
        return highlight(&next);
    }

    match trigger {
        Some(Command::Parameterize) => parameterize(&next),
        _ => Ok(next),
    }
}

/// Computes where a motion puts the selection.
///
/// With `extend` the anchor stays and only the focus moves, within the
/// current block. Without it a non-collapsed selection first collapses
/// toward the motion.
pub fn motion_target(
    state: &EditorState,
    motion: Motion,
    extend: bool,
) -> CoreResult<SelectionRange> {
    let selection = state.selection;
    let block = selection.block;
    let len = block_len(&state.content, block)?;

    if !extend && !selection.is_collapsed() {
        return Ok(match motion {
            Motion::Left => selection.collapse_to_start(),
            Motion::Right => selection.collapse_to_end(),
            Motion::Home => SelectionRange::caret(block, 0),
            Motion::End => SelectionRange::caret(block, len),
        });
    }

    let focus = selection.focus;
    let target = match motion {
        Motion::Left => focus.saturating_sub(1),
        Motion::Right => (focus + 1).min(len),
        Motion::Home => 0,
        Motion::End => len,
    };

    if extend {
        return Ok(SelectionRange::new(block, selection.anchor, target));
    }

    // Crossing into a neighbouring block
    if motion == Motion::Left && focus == 0 {
        if let Some(previous) = previous_block(&state.content, block) {
            return Ok(SelectionRange::caret(previous.0, previous.1));
        }
    }
    if motion == Motion::Right && focus == len {
        if let Some(next) = state.content.block_after(block) {
            return Ok(SelectionRange::caret(next.id(), 0));
        }
    }

    Ok(SelectionRange::caret(block, target))
}

// ==================== Commands ====================

/// Runs an explicit command against the state.
pub fn on_command(state: &EditorState, command: &Command) -> CoreResult<EditorState> {
    match command {
        Command::Parameterize => parameterize(state),
        Command::Highlight => on_selection_change(state, state.selection, None),
        Command::ReplaceParam { text } => replace_param(state, text),
        Command::RemoveEntity { block, start, end } => {
            let span = SelectionRange::new(*block, *start, *end);
            let content = remove_entity(&state.content, *block, span.start(), span.end())?;
            finish_removal(state, content, *block, span.range())
        }
        Command::RemoveEntityById { block, entity } => {
            let Some(range) = state.content.entity_range(*block, *entity) else {
                tracing::debug!(%entity, %block, "entity not found, nothing to remove");
                return Ok(state.clone());
            };
            match remove_entity_by_id(&state.content, *block, *entity)? {
                Some(content) => finish_removal(state, content, *block, range.range()),
                None => Ok(state.clone()),
            }
        }
    }
}

/// Patches after a removal and shifts the caret over the removed span.
fn finish_removal(
    state: &EditorState,
    content: ContentModel,
    block: BlockId,
    removed: std::ops::Range<usize>,
) -> CoreResult<EditorState> {
    let content = patch_entities(&content)?;
    let mut selection = state.selection;
    if selection.block == block {
        let shift = |offset: usize| {
            if offset >= removed.end {
                offset - removed.len()
            } else {
                offset.min(removed.start)
            }
        };
        selection = SelectionRange::new(block, shift(selection.anchor), shift(selection.focus));
    }
    Ok(EditorState::new(content, selection).clamped())
}

// ==================== Helpers ====================

fn block_len(content: &ContentModel, block: BlockId) -> CoreResult<usize> {
    content
        .block(block)
        .map(|b| b.len_chars())
        .ok_or(CoreError::Buffer(stencil_buffer::BufferError::UnknownBlock(block)))
}

fn previous_block(content: &ContentModel, block: BlockId) -> Option<(BlockId, usize)> {
    let index = content.block_index(block)?.checked_sub(1)?;
    content
        .block_at(index)
        .map(|previous| (previous.id(), previous.len_chars()))
}
