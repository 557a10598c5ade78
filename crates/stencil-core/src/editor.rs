//! Main editor orchestration.
//!
//! ## Learning: The Facade Pattern
//!
//! `Editor` acts as a facade over the pure transitions in
//! [`controller`](crate::controller). It owns the current
//! [`EditorState`] plus everything the rendering layer needs around
//! it: the known variables, the render-position cache and the event
//! bus.
//!
//! Dispatches never fail loudly. An invalid request is logged and the
//! state stays as it was.

use std::time::Duration;

use stencil_buffer::{BlockId, ContentModel, EntityId, SelectionRange};

use crate::autocomplete::{self, Autocomplete, VariableSet};
use crate::command::Command;
use crate::config::Config;
use crate::controller::{self, ContentEdit, Motion};
use crate::entity::{self, ActiveParam};
use crate::event::{EditorEvent, EventBus};
use crate::keymap::{Key, KeyPress, Keymap};
use crate::render::{self, BlockDecoration, Rect, RenderCache};
use crate::{CoreResult, EditorState};

/// The main editor state.
///
/// ## Thread Safety
///
/// `Editor` is owned by a single thread (the UI thread). Each dispatch
/// runs to completion before the next one. Other components observe it
/// through [`subscribe`](Editor::subscribe).
pub struct Editor {
    /// Current document and selection
    state: EditorState,

    /// Editor configuration
    config: Config,

    /// Key bindings
    keymap: Keymap,

    /// Names offered by autocomplete
    variables: VariableSet,

    /// Where the renderer last drew each entity
    render_cache: RenderCache,

    /// Event bus for notifications
    event_bus: EventBus,
}

impl Editor {
    /// Creates an editor with an empty document.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an editor with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let keymap = Keymap::from_config(&config);
        Self {
            state: EditorState::default(),
            config,
            keymap,
            variables: VariableSet::new(),
            render_cache: RenderCache::new(),
            event_bus: EventBus::new(),
        }
    }

    /// Creates an editor over plain text, one block per line.
    pub fn from_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.state = EditorState::from_text(text);
        editor
    }

    /// Replaces the whole document, caret at its start.
    pub fn load_content(&mut self, content: ContentModel) {
        self.commit(EditorState::with_content(content));
    }

    // ==================== State ====================

    /// Returns the current document and selection.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn content(&self) -> &ContentModel {
        &self.state.content
    }

    pub fn selection(&self) -> SelectionRange {
        self.state.selection
    }

    /// Returns the render-position cache.
    pub fn render_positions(&self) -> &RenderCache {
        &self.render_cache
    }

    /// Returns the document split into renderable segments.
    pub fn decorations(&self) -> Vec<BlockDecoration> {
        render::decorate(&self.state.content)
    }

    // ==================== Dispatch ====================

    /// Applies a raw content edit at the current selection.
    pub fn dispatch_content_edit(&mut self, edit: ContentEdit) {
        let result = controller::on_content_edit(&self.state, &edit);
        self.apply("content edit", result);
    }

    /// Accepts a selection change reported by the UI.
    pub fn dispatch_selection_change(&mut self, selection: SelectionRange) {
        let result = controller::on_selection_change(&self.state, selection, None);
        self.apply("selection change", result);
    }

    /// Inserts a new parameter at the selection.
    pub fn dispatch_parameterize_command(&mut self) {
        self.execute(Command::Parameterize);
    }

    /// Removes `[start, end)` from `block`, entity mapping included.
    pub fn dispatch_remove_entity(&mut self, block: BlockId, start: usize, end: usize) {
        self.execute(Command::RemoveEntity { block, start, end });
    }

    /// Removes the run of `entity` in `block`.
    pub fn remove_entity(&mut self, block: BlockId, entity: EntityId) {
        self.execute(Command::RemoveEntityById { block, entity });
    }

    /// Replaces the active parameter's name.
    pub fn dispatch_replace_param(&mut self, text: &str) {
        self.execute(Command::ReplaceParam {
            text: text.to_string(),
        });
    }

    /// Runs a command.
    pub fn execute(&mut self, command: Command) {
        tracing::debug!(%command, "executing command");
        let result = controller::on_command(&self.state, &command);
        self.apply(command.display_name(), result);
    }

    /// Handles a raw key press.
    ///
    /// Bound keys run their command. The parameterize binding only fires
    /// on a collapsed selection; otherwise the key is typed normally.
    pub fn dispatch_key(&mut self, key: KeyPress) {
        if let Some(command) = self.keymap.lookup(&key).cloned() {
            if command != Command::Parameterize {
                self.execute(command);
                return;
            }
            if self.state.selection.is_collapsed() {
                let result = controller::on_selection_change(
                    &self.state,
                    self.state.selection,
                    Some(&command),
                );
                self.apply("parameterize key", result);
                return;
            }
        }

        if key.modifiers.has_command_modifier() {
            tracing::debug!(%key, "unbound key");
            return;
        }

        let extend = key.modifiers.shift;
        match key.key {
            Key::Enter => self.dispatch_content_edit(ContentEdit::SplitBlock),
            Key::Backspace => self.dispatch_content_edit(ContentEdit::DeleteBackward),
            Key::Delete => self.dispatch_content_edit(ContentEdit::DeleteForward),
            Key::Left => self.dispatch_motion(Motion::Left, extend),
            Key::Right => self.dispatch_motion(Motion::Right, extend),
            Key::Home => self.dispatch_motion(Motion::Home, extend),
            Key::End => self.dispatch_motion(Motion::End, extend),
            Key::Char(_) | Key::Space => {
                if let Some(c) = key.key.text() {
                    self.dispatch_content_edit(ContentEdit::InsertText(c.to_string()));
                }
            }
        }
    }

    fn dispatch_motion(&mut self, motion: Motion, extend: bool) {
        match controller::motion_target(&self.state, motion, extend) {
            Ok(target) => self.dispatch_selection_change(target),
            Err(err) => tracing::warn!(error = %err, "ignoring motion"),
        }
    }

    // ==================== Rendering ====================

    /// Records where the renderer drew a parameter; highlights are not tracked.
    pub fn register_entity_render_position(&mut self, block: BlockId, entity: EntityId, rect: Rect) {
        let content = &self.state.content;
        let live = content.block(block).is_some_and(|b| b.references(entity));
        let is_parameter = content.entity(entity).is_some_and(|e| e.is_parameter());
        if !live || !is_parameter {
            tracing::debug!(%entity, %block, "ignoring position of non-parameter entity");
            return;
        }
        self.render_cache.insert(block, entity, rect);
    }

    // ==================== Autocomplete ====================

    /// Returns the parameter under the caret.
    pub fn active_param(&self) -> Option<ActiveParam> {
        entity::active_param(&self.state)
    }

    /// Returns what the autocomplete popup should show, if anything.
    pub fn autocomplete(&self) -> Option<Autocomplete> {
        autocomplete::autocomplete(
            &self.state,
            &self.variables,
            &self.render_cache,
            &self.config.autocomplete,
        )
    }

    /// How long the UI should wait before re-focusing after a replacement.
    pub fn refocus_delay(&self) -> Duration {
        Duration::from_millis(self.config.autocomplete.refocus_delay_ms)
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Replaces the known variables.
    pub fn set_variables(&mut self, variables: VariableSet) {
        if self.variables != variables {
            self.variables = variables;
            self.emit(EditorEvent::VariablesChanged);
        }
    }

    // ==================== Configuration ====================

    /// Returns the editor configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Updates the configuration.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.keymap = Keymap::from_config(&self.config);
        self.emit(EditorEvent::ConfigChanged);
    }

    /// Returns the keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    // ==================== Events ====================

    /// Subscribes to editor events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EditorEvent> {
        self.event_bus.subscribe()
    }

    fn emit(&self, event: EditorEvent) {
        self.event_bus.emit(event);
    }

    fn apply(&mut self, action: &str, result: CoreResult<EditorState>) {
        match result {
            Ok(next) => self.commit(next),
            Err(err) => tracing::warn!(action, error = %err, "ignoring invalid dispatch"),
        }
    }

    fn commit(&mut self, next: EditorState) {
        let previous = std::mem::replace(&mut self.state, next);
        let current = &self.state;

        if previous.content != current.content {
            for created in current.content.entities() {
                if previous.content.entity(created.id).is_none() {
                    self.event_bus.emit(EditorEvent::EntityCreated {
                        entity: created.id,
                        kind: created.kind,
                    });
                }
            }
            for removed in previous.content.entities() {
                if current.content.entity(removed.id).is_none() {
                    self.event_bus.emit(EditorEvent::EntityRemoved(removed.id));
                }
            }
            self.render_cache.retain_live(&current.content);
            self.event_bus.emit(EditorEvent::ContentChanged);
        }

        if previous.selection != current.selection {
            self.event_bus
                .emit(EditorEvent::SelectionChanged(current.selection));
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
