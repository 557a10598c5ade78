//! Variable suggestions for the parameter under the caret.

use serde::{Deserialize, Serialize};
use stencil_buffer::{BlockId, EntityId};

use crate::config::AutocompleteConfig;
use crate::entity::active_param;
use crate::render::{Rect, RenderCache};
use crate::EditorState;

/// Ordered list of known variable names without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet {
    names: Vec<String>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a name. Returns false if it was already known.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Removes a name. Returns false if it was unknown.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names containing `query` but not equal to it, in list order.
    ///
    /// An exact match is left out since accepting it would change nothing.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<&str> {
        self.iter()
            .filter(|name| name.contains(query) && *name != query)
            .take(limit)
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for VariableSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// What the autocomplete popup should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Autocomplete {
    pub entity: EntityId,
    pub block: BlockId,
    /// Current parameter name, without `$` and magic space
    pub query: String,
    pub suggestions: Vec<String>,
    /// Where to draw the popup, if the parameter has been rendered
    pub anchor: Option<Rect>,
}

/// Builds the popup for the active parameter, if there is one.
pub fn autocomplete(
    state: &EditorState,
    variables: &VariableSet,
    positions: &RenderCache,
    config: &AutocompleteConfig,
) -> Option<Autocomplete> {
    let active = active_param(state)?;
    let suggestions = variables
        .suggestions(&active.name, config.max_suggestions)
        .into_iter()
        .map(str::to_owned)
        .collect();
    let anchor = positions
        .get(active.block, active.entity)
        .map(|rect| rect.offset_y(config.vertical_offset));

    Some(Autocomplete {
        entity: active.entity,
        block: active.block,
        query: active.name,
        suggestions,
        anchor,
    })
}
