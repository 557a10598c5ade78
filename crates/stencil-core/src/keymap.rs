//! Keyboard mapping and input handling.
//!
//! ## Learning: Normalizing Input
//!
//! The UI reports raw key presses. A `$` typically arrives as
//! `Shift + '$'` on one platform and as a bare `'$'` on another, so
//! for printable characters the shift modifier is dropped before the
//! lookup. Everything else must match exactly.

use crate::command::Command;
use crate::config::Config;
use std::collections::HashMap;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Shift modifier.
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// Returns true if a command modifier (not shift) is held.
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    /// Parses modifiers from a string like "ctrl+shift".
    pub fn parse(s: &str) -> Self {
        let mut mods = Modifiers::NONE;
        let lower = s.to_lowercase();
        if lower.contains("ctrl") || lower.contains("control") {
            mods.ctrl = true;
        }
        if lower.contains("alt") || lower.contains("option") {
            mods.alt = true;
        }
        if lower.contains("shift") {
            mods.shift = true;
        }
        if lower.contains("meta") || lower.contains("cmd") || lower.contains("win") {
            mods.meta = true;
        }
        mods
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

impl Key {
    /// Parses a key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "space" => Some(Key::Space),
            "enter" | "return" => Some(Key::Enter),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(' '), None) => Some(Key::Space),
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }

    /// Returns the text this key types, if it is printable.
    pub fn text(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            Key::Space => Some(' '),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Space => write!(f, "Space"),
            Key::Enter => write!(f, "Enter"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A printable character with no modifiers.
    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    /// Parses a key binding string like "ctrl+p" or "$".
    pub fn parse(s: &str) -> Option<Self> {
        // A lone "+" is the plus key, not a separator
        if s == "+" {
            return Some(Self::char('+'));
        }

        let parts: Vec<&str> = s.split('+').collect();
        let key_str = parts.last()?;
        let key = Key::parse(key_str)?;

        let mod_str = parts[..parts.len() - 1].join("+");
        let modifiers = Modifiers::parse(&mod_str);

        Some(Self { key, modifiers })
    }

    /// Drops shift from printable keys, where it is already reflected
    /// in the character itself.
    pub fn normalized(&self) -> Self {
        let mut modifiers = self.modifiers;
        if matches!(self.key, Key::Char(_)) {
            modifiers.shift = false;
        }
        Self::new(self.key, modifiers)
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// A key binding maps a key press to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyPress,
    pub command: Command,
}

impl KeyBinding {
    pub fn new(key: KeyPress, command: Command) -> Self {
        Self {
            key: key.normalized(),
            command,
        }
    }
}

/// Keyboard mapping configuration.
#[derive(Debug, Clone)]
pub struct Keymap {
    /// All key bindings, one per key.
    bindings: Vec<KeyBinding>,
    /// Index into `bindings` for fast lookup.
    by_key: HashMap<KeyPress, usize>,
}

impl Keymap {
    /// Creates a keymap with default bindings.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: Vec::new(),
            by_key: HashMap::new(),
        };
        keymap.add_binding(KeyBinding::new(
            KeyPress::char(crate::entity::PARAM_MARKER),
            Command::Parameterize,
        ));
        keymap
    }

    /// Creates a keymap from configuration.
    ///
    /// Unparseable entries are skipped with a warning.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();

        for (key_str, cmd_str) in &config.keyboard.bindings {
            match (KeyPress::parse(key_str), Command::parse(cmd_str)) {
                (Some(key), Some(command)) => keymap.add_binding(KeyBinding::new(key, command)),
                _ => tracing::warn!(key = %key_str, command = %cmd_str, "ignoring invalid key binding"),
            }
        }

        keymap
    }

    /// Returns the command bound to a key press.
    pub fn lookup(&self, key: &KeyPress) -> Option<&Command> {
        self.by_key
            .get(&key.normalized())
            .map(|&index| &self.bindings[index].command)
    }

    /// Returns all bindings.
    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Adds a binding, replacing any earlier binding for the same key.
    pub fn add_binding(&mut self, binding: KeyBinding) {
        match self.by_key.get(&binding.key) {
            Some(&index) => self.bindings[index] = binding,
            None => {
                self.by_key.insert(binding.key, self.bindings.len());
                self.bindings.push(binding);
            }
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
