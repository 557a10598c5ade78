//! The single value observed by the outside world.

use stencil_buffer::{ContentModel, SelectionRange};

/// Document content plus the user's selection.
///
/// Every transition in [`controller`](crate::controller) and
/// [`entity`](crate::entity) takes an `EditorState` by reference and
/// returns the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub content: ContentModel,
    pub selection: SelectionRange,
}

impl EditorState {
    pub fn new(content: ContentModel, selection: SelectionRange) -> Self {
        Self { content, selection }
    }

    /// Wraps content with a caret at the start of the first block.
    pub fn with_content(content: ContentModel) -> Self {
        let selection = SelectionRange::caret(content.first_block().id(), 0);
        Self { content, selection }
    }

    pub fn from_text(text: &str) -> Self {
        Self::with_content(ContentModel::from_text(text))
    }

    /// Same content, different selection.
    pub fn with_selection(&self, selection: SelectionRange) -> Self {
        Self {
            content: self.content.clone(),
            selection,
        }
    }

    /// Returns the selected text, or an empty string for a stale selection.
    pub fn selected_text(&self) -> String {
        self.content
            .selected_text(&self.selection)
            .unwrap_or_default()
    }

    /// Pulls the selection back inside the document.
    ///
    /// A selection whose block disappeared lands at the start of the
    /// document; otherwise offsets are clamped to the block length.
    pub fn clamped(self) -> Self {
        let selection = match self.content.block(self.selection.block) {
            Some(block) => self.selection.clamp(block.len_chars()),
            None => SelectionRange::caret(self.content.first_block().id(), 0),
        };
        Self { selection, ..self }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::with_content(ContentModel::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_buffer::BlockId;

    #[test]
    fn test_default_state_is_empty_caret() {
        let state = EditorState::default();
        assert!(state.selection.is_collapsed());
        assert_eq!(state.selection.block, state.content.first_block().id());
        assert_eq!(state.content.plain_text(), "");
    }

    #[test]
    fn test_clamped_fixes_stale_selection() {
        let state = EditorState::from_text("abc");
        let block = state.selection.block;

        let over = state.with_selection(SelectionRange::new(block, 1, 9)).clamped();
        assert_eq!(over.selection, SelectionRange::new(block, 1, 3));

        let gone = state
            .with_selection(SelectionRange::caret(BlockId::new(), 2))
            .clamped();
        assert_eq!(gone.selection, SelectionRange::caret(block, 0));
    }
}
