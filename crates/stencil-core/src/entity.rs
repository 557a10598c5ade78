//! The parameter/highlight lifecycle.
//!
//! ## The Magic Space
//!
//! A character only joins an entity when it is typed strictly inside
//! the entity's run. To let the user keep typing at the end of a
//! parameter or highlight, every run carries one trailing space:
//!
//! ```text
//!   $foo␣        caret before ␣ -> typed chars join the parameter
//!   ^^^^^
//! ```
//!
//! The price is upkeep after each edit ([`patch_entities`]):
//! 1. Runs that collapsed to just the space, or parameters that lost
//!    their `$`, are deleted outright.
//! 2. Runs whose last char is not a space get one appended.
//!
//! Stray removal must come first, otherwise step 2 would re-pad a run
//! that is about to be deleted.

use stencil_buffer::{
    BlockId, BufferResult, ContentModel, Entity, EntityData, EntityId, EntityKind, EntitySpan,
    SelectionRange, TextBlock,
};

use crate::{CoreResult, EditorState};

/// First character of every parameter run.
pub const PARAM_MARKER: char = '$';

/// Trailing character that keeps the caret inside an entity.
pub const MAGIC_SPACE: char = ' ';

/// Text inserted when a new parameter is created.
pub const PARAM_PLACEHOLDER: &str = "$ ";

/// A parameter under a collapsed caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveParam {
    pub entity: EntityId,
    pub block: BlockId,
    /// The full run, `$` and magic space included
    pub range: SelectionRange,
    /// The run without its leading `$` and trailing magic space
    pub name: String,
}

// ==================== Creation ====================

/// Attaches a new entity to `selection` unless it would overlap one.
///
/// The overlap check looks at the first and last selected characters.
/// Returns `None` (and leaves the document alone) when either is
/// already taken.
pub fn create_removable_entity(
    content: &ContentModel,
    selection: &SelectionRange,
    kind: EntityKind,
) -> Option<(ContentModel, EntityId)> {
    if selection.is_collapsed() || !content.is_valid_selection(selection) {
        return None;
    }

    let existing = content
        .entity_at(selection.block, selection.start())
        .or_else(|| content.entity_at(selection.block, selection.end() - 1));
    if let Some(existing) = existing {
        tracing::debug!(%existing, "entity already exists at location, not recreating");
        return None;
    }

    let (content, id) = content.create_entity(kind, EntityData::default());
    match content.apply_entity(selection, Some(id)) {
        Ok(content) => {
            tracing::debug!(entity = %id, %kind, block = %selection.block, "created entity");
            Some((content, id))
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not apply new entity");
            None
        }
    }
}

/// Inserts a `"$ "` parameter at the selection.
///
/// The caret ends up between `$` and the magic space, ready for the
/// name. If the placeholder lands on an existing entity the parameter
/// is not created, but the typed placeholder stays. The result is
/// patched like any other content edit.
pub fn parameterize(state: &EditorState) -> CoreResult<EditorState> {
    let selection = state.selection;
    let start = selection.start();

    let with_placeholder = state
        .content
        .insert_text(&selection, PARAM_PLACEHOLDER, None)?;

    let span = SelectionRange::new(selection.block, start, start + PARAM_PLACEHOLDER.chars().count());
    let content = match create_removable_entity(&with_placeholder, &span, EntityKind::Parameter) {
        Some((content, _)) => content,
        None => with_placeholder,
    };

    // Replacing a selection may have cut into other runs
    let content = patch_entities(&content)?;
    Ok(EditorState::new(content, SelectionRange::caret(selection.block, start + 1)).clamped())
}

/// Turns the current selection into a highlight.
///
/// On success the document is patched and the caret moves to the end
/// of the highlight (after its magic space).
pub fn highlight(state: &EditorState) -> CoreResult<EditorState> {
    let Some((content, id)) =
        create_removable_entity(&state.content, &state.selection, EntityKind::Highlight)
    else {
        return Ok(state.clone());
    };

    let content = patch_entities(&content)?;
    let selection = content
        .entity_range(state.selection.block, id)
        .map(|range| range.collapse_to_end())
        .unwrap_or(state.selection);

    Ok(EditorState::new(content, selection).clamped())
}

// ==================== Patching ====================

/// Repairs entity runs after a content edit.
pub fn patch_entities(content: &ContentModel) -> BufferResult<ContentModel> {
    let cleaned = remove_stray_entities(content)?;
    let padded = restore_magic_spaces(&cleaned)?;
    let patched = padded.prune_entities();
    tracing::trace!(
        before = content.entity_count(),
        after = patched.entity_count(),
        "patched entities"
    );
    Ok(patched)
}

/// Deletes runs that are only a magic space, and parameters without `$`.
pub fn remove_stray_entities(content: &ContentModel) -> BufferResult<ContentModel> {
    let mut next = content.clone();
    for block in content.blocks() {
        // Right to left so earlier offsets stay valid
        for span in block.entity_spans().into_iter().rev() {
            if is_stray(content, block, &span) {
                tracing::debug!(entity = %span.entity, block = %block.id(), "removing stray entity");
                next = clear_and_delete(&next, block.id(), span.start, span.end)?;
            }
        }
    }
    Ok(next)
}

/// Appends a magic space to every run that does not end with one.
pub fn restore_magic_spaces(content: &ContentModel) -> BufferResult<ContentModel> {
    let mut next = content.clone();
    for block in content.blocks() {
        for span in block.entity_spans().into_iter().rev() {
            if block.char_at(span.end - 1) != Some(MAGIC_SPACE) {
                let caret = SelectionRange::caret(block.id(), span.end);
                next = next.insert_text(&caret, &MAGIC_SPACE.to_string(), Some(span.entity))?;
            }
        }
    }
    Ok(next)
}

fn is_stray(content: &ContentModel, block: &TextBlock, span: &EntitySpan) -> bool {
    if span.len() == 1 && block.char_at(span.start) == Some(MAGIC_SPACE) {
        return true;
    }
    content.entity(span.entity).is_some_and(Entity::is_parameter)
        && block.char_at(span.start) != Some(PARAM_MARKER)
}

// ==================== Lookup ====================

/// Returns the parameter under a collapsed caret, if any.
pub fn active_param(state: &EditorState) -> Option<ActiveParam> {
    let selection = &state.selection;
    if !selection.is_collapsed() {
        return None;
    }

    let entity = state.content.entity_at(selection.block, selection.focus)?;
    if !state.content.entity(entity)?.is_parameter() {
        return None;
    }

    let range = state.content.entity_range(selection.block, entity)?;
    let text = state.content.selected_text(&range).ok()?;
    Some(ActiveParam {
        entity,
        block: selection.block,
        range,
        name: display_name(&text),
    })
}

/// Strips the leading `$` and the trailing magic space.
pub fn display_name(run: &str) -> String {
    let count = run.chars().count();
    if count < 2 {
        return String::new();
    }
    run.chars().skip(1).take(count - 2).collect()
}

// ==================== Replacement & Removal ====================

/// Replaces the active parameter's text with `$<replacement> `.
///
/// The entity id is kept and the caret moves after the new text.
/// Without an active parameter the state is returned unchanged.
pub fn replace_param(state: &EditorState, replacement: &str) -> CoreResult<EditorState> {
    let Some(active) = active_param(state) else {
        tracing::debug!("no active parameter to replace");
        return Ok(state.clone());
    };

    let text = format!("{PARAM_MARKER}{replacement}{MAGIC_SPACE}");
    let content = state
        .content
        .insert_text(&active.range, &text, Some(active.entity))?;
    let caret = active.range.start() + text.chars().count();

    Ok(EditorState::new(
        content,
        SelectionRange::caret(active.block, caret),
    ))
}

/// Clears the entity overlay over `[start, end)` and deletes the text.
///
/// Only `block` is touched; entities never span blocks.
pub fn remove_entity(
    content: &ContentModel,
    block: BlockId,
    start: usize,
    end: usize,
) -> BufferResult<ContentModel> {
    Ok(clear_and_delete(content, block, start, end)?.prune_entities())
}

/// Removes the whole run of `entity` in `block`.
///
/// Returns `None` when the entity has no run there.
pub fn remove_entity_by_id(
    content: &ContentModel,
    block: BlockId,
    entity: EntityId,
) -> BufferResult<Option<ContentModel>> {
    let Some(range) = content.entity_range(block, entity) else {
        tracing::debug!(%entity, %block, "entity not found, nothing to remove");
        return Ok(None);
    };
    remove_entity(content, block, range.start(), range.end()).map(Some)
}

fn clear_and_delete(
    content: &ContentModel,
    block: BlockId,
    start: usize,
    end: usize,
) -> BufferResult<ContentModel> {
    let selection = SelectionRange::new(block, start, end);
    content
        .apply_entity(&selection, None)?
        .delete_range(&selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a one-block state with entities applied over `runs`.
    fn state_with(text: &str, runs: &[(std::ops::Range<usize>, EntityKind)]) -> (EditorState, Vec<EntityId>) {
        let mut content = ContentModel::from_text(text);
        let block = content.first_block().id();
        let mut ids = Vec::new();
        for (range, kind) in runs {
            let (next, id) = content.create_entity(*kind, EntityData::default());
            content = next
                .apply_entity(&SelectionRange::from_range(block, range.clone()), Some(id))
                .unwrap();
            ids.push(id);
        }
        (EditorState::with_content(content), ids)
    }

    fn block_of(state: &EditorState) -> BlockId {
        state.content.first_block().id()
    }

    #[test]
    fn test_parameterize_empty_document() {
        let state = EditorState::default();
        let next = parameterize(&state).unwrap();
        let block = block_of(&next);

        assert_eq!(next.content.plain_text(), "$ ");
        let id = next.content.entity_at(block, 0).unwrap();
        assert!(next.content.entity(id).unwrap().is_parameter());
        assert_eq!(next.content.entity_range(block, id).unwrap().range(), 0..2);
        assert_eq!(next.selection, SelectionRange::caret(block, 1));
    }

    #[test]
    fn test_parameterize_inside_entity_keeps_placeholder_text() {
        let (state, ids) = state_with("ab cd ", &[(0..6, EntityKind::Highlight)]);
        let block = block_of(&state);
        let state = state.with_selection(SelectionRange::caret(block, 2));

        let next = parameterize(&state).unwrap();
        assert_eq!(next.content.plain_text(), "ab$  cd ");
        // Placeholder joined the surrounding highlight; no parameter made
        assert_eq!(next.content.entity_count(), 1);
        assert_eq!(next.content.entity_at(block, 2), Some(ids[0]));
        assert_eq!(next.selection, SelectionRange::caret(block, 3));
    }

    #[test]
    fn test_create_entity_guard_checks_both_ends() {
        let (state, _) = state_with("hello world", &[(6..8, EntityKind::Highlight)]);
        let block = block_of(&state);

        let overlapping_end = SelectionRange::new(block, 2, 7);
        assert!(create_removable_entity(&state.content, &overlapping_end, EntityKind::Highlight).is_none());

        let overlapping_start = SelectionRange::new(block, 7, 10);
        assert!(create_removable_entity(&state.content, &overlapping_start, EntityKind::Highlight).is_none());

        let clear = SelectionRange::new(block, 0, 5);
        assert!(create_removable_entity(&state.content, &clear, EntityKind::Highlight).is_some());
    }

    #[test]
    fn test_highlight_adds_magic_space_and_moves_caret() {
        let state = EditorState::from_text("hello world");
        let block = block_of(&state);
        let state = state.with_selection(SelectionRange::new(block, 0, 5));

        let next = highlight(&state).unwrap();
        assert_eq!(next.content.plain_text(), "hello  world");
        let id = next.content.entity_at(block, 0).unwrap();
        assert_eq!(next.content.entity(id).unwrap().kind, EntityKind::Highlight);
        assert_eq!(next.content.entity_range(block, id).unwrap().range(), 0..6);
        assert_eq!(next.selection, SelectionRange::caret(block, 6));
    }

    #[test]
    fn test_highlight_over_existing_entity_is_noop() {
        let (state, _) = state_with("hello world ", &[(6..12, EntityKind::Highlight)]);
        let block = block_of(&state);
        let state = state.with_selection(SelectionRange::new(block, 3, 8));

        let next = highlight(&state).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_stray_space_run_is_removed() {
        let (state, _) = state_with("a b", &[(1..2, EntityKind::Highlight)]);
        let patched = patch_entities(&state.content).unwrap();
        assert_eq!(patched.plain_text(), "ab");
        assert_eq!(patched.entity_count(), 0);
    }

    #[test]
    fn test_parameter_without_marker_is_removed() {
        let (state, _) = state_with("x foo y", &[(2..6, EntityKind::Parameter)]);
        let patched = patch_entities(&state.content).unwrap();
        assert_eq!(patched.plain_text(), "x y");
        assert_eq!(patched.entity_count(), 0);
    }

    #[test]
    fn test_deleting_marker_clears_parameter_in_one_pass() {
        let (state, _) = state_with("$ ", &[(0..2, EntityKind::Parameter)]);
        let block = block_of(&state);
        let edited = state
            .content
            .delete_range(&SelectionRange::new(block, 0, 1))
            .unwrap();
        assert_eq!(edited.plain_text(), " ");

        let patched = patch_entities(&edited).unwrap();
        assert_eq!(patched.plain_text(), "");
        assert_eq!(patched.entity_count(), 0);
    }

    #[test]
    fn test_restore_magic_space() {
        let (state, ids) = state_with("$foo bar", &[(0..4, EntityKind::Parameter)]);
        let block = block_of(&state);
        let patched = patch_entities(&state.content).unwrap();
        assert_eq!(patched.plain_text(), "$foo  bar");
        assert_eq!(patched.entity_range(block, ids[0]).unwrap().range(), 0..5);
    }

    #[test]
    fn test_patch_handles_several_runs_per_block() {
        let (state, ids) = state_with(
            "$a x $b",
            &[
                (0..2, EntityKind::Parameter),
                (3..4, EntityKind::Highlight),
                (5..7, EntityKind::Parameter),
            ],
        );
        let block = block_of(&state);
        let patched = patch_entities(&state.content).unwrap();
        assert_eq!(patched.plain_text(), "$a  x  $b ");
        assert_eq!(patched.entity_range(block, ids[0]).unwrap().range(), 0..3);
        assert_eq!(patched.entity_range(block, ids[1]).unwrap().range(), 4..6);
        assert_eq!(patched.entity_range(block, ids[2]).unwrap().range(), 7..10);
    }

    #[test]
    fn test_active_param_display_name() {
        let (state, ids) = state_with("$foo ", &[(0..5, EntityKind::Parameter)]);
        let block = block_of(&state);
        let state = state.with_selection(SelectionRange::caret(block, 2));

        let active = active_param(&state).unwrap();
        assert_eq!(active.entity, ids[0]);
        assert_eq!(active.name, "foo");
        assert_eq!(active.range.range(), 0..5);
    }

    #[test]
    fn test_active_param_requires_collapsed_parameter() {
        let (state, _) = state_with("$foo hi ", &[(0..5, EntityKind::Parameter), (5..8, EntityKind::Highlight)]);
        let block = block_of(&state);

        assert!(active_param(&state.with_selection(SelectionRange::new(block, 1, 3))).is_none());
        assert!(active_param(&state.with_selection(SelectionRange::caret(block, 6))).is_none());
        assert!(active_param(&state.with_selection(SelectionRange::caret(block, 8))).is_none());
    }

    #[test]
    fn test_display_name_edge_cases() {
        assert_eq!(display_name("$ "), "");
        assert_eq!(display_name("$"), "");
        assert_eq!(display_name("$naïve "), "naïve");
    }

    #[test]
    fn test_replace_param_keeps_entity() {
        let (state, ids) = state_with("say $fo now", &[(4..8, EntityKind::Parameter)]);
        let block = block_of(&state);
        let state = state.with_selection(SelectionRange::caret(block, 6));

        let next = replace_param(&state, "foo").unwrap();
        assert_eq!(next.content.plain_text(), "say $foo now");
        assert_eq!(next.content.entity_range(block, ids[0]).unwrap().range(), 4..9);
        assert_eq!(next.selection, SelectionRange::caret(block, 9));
    }

    #[test]
    fn test_replace_param_without_active_param_is_noop() {
        let state = EditorState::from_text("plain");
        assert_eq!(replace_param(&state, "foo").unwrap(), state);
    }

    #[test]
    fn test_remove_entity_deletes_text_and_record() {
        let (state, ids) = state_with("keep $x drop", &[(5..8, EntityKind::Parameter)]);
        let block = block_of(&state);

        let removed = remove_entity(&state.content, block, 5, 8).unwrap();
        assert_eq!(removed.plain_text(), "keep drop");
        assert!(removed.entity(ids[0]).is_none());

        let by_id = remove_entity_by_id(&state.content, block, ids[0]).unwrap().unwrap();
        assert_eq!(by_id, removed);
        assert!(remove_entity_by_id(&removed, block, ids[0]).unwrap().is_none());
    }
}
