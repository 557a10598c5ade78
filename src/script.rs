//! Line-oriented editing scripts.
//!
//! Each non-empty line is one step; `#` starts a comment line.
//!
//! ```text
//! # "{$name }, welcome!"
//! key $
//! type name
//! caret 0 6
//! type , welcome!
//! show
//! ```
//!
//! Blocks are addressed by their index in the document.

use stencil_buffer::{EntityId, SelectionRange};
use stencil_core::{Command, ContentEdit, Editor, KeyPress, Rect};

/// Errors produced while parsing or running a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown step `{word}`")]
    UnknownStep { line: usize, word: String },

    #[error("line {line}: {message}")]
    BadArguments { line: usize, message: String },

    #[error("line {line}: document has no block {index}")]
    NoSuchBlock { line: usize, index: usize },
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Type(String),
    Enter,
    Backspace,
    Delete,
    Select {
        block: usize,
        anchor: usize,
        focus: usize,
    },
    Caret {
        block: usize,
        offset: usize,
    },
    Key(KeyPress),
    Param,
    Replace(String),
    Remove {
        block: usize,
        start: usize,
        end: usize,
    },
    Run(Command),
    Rect {
        block: usize,
        entity: EntityId,
        rect: Rect,
    },
    Show,
}

/// A step together with the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub step: Step,
}

/// Parses a whole script.
pub fn parse(source: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = parse_step(number, trimmed)?;
        lines.push(Line { number, step });
    }
    Ok(lines)
}

fn parse_step(line: usize, text: &str) -> Result<Step, ScriptError> {
    // Text arguments keep their inner and trailing spaces
    let (word, rest) = match text.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (text, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let bad = |message: &str| ScriptError::BadArguments {
        line,
        message: format!("{word}: {message}"),
    };

    let numbers = |count: usize| -> Result<Vec<usize>, ScriptError> {
        if args.len() != count {
            return Err(bad(&format!("expected {count} numbers")));
        }
        args.iter()
            .map(|arg| arg.parse().map_err(|_| bad(&format!("`{arg}` is not a number"))))
            .collect()
    };

    let step = match word {
        "type" => Step::Type(rest.to_string()),
        "enter" => Step::Enter,
        "backspace" => Step::Backspace,
        "delete" => Step::Delete,
        "param" => Step::Param,
        "show" => Step::Show,
        "replace" => Step::Replace(rest.trim().to_string()),
        "select" => {
            let n = numbers(3)?;
            Step::Select {
                block: n[0],
                anchor: n[1],
                focus: n[2],
            }
        }
        "caret" => {
            let n = numbers(2)?;
            Step::Caret {
                block: n[0],
                offset: n[1],
            }
        }
        "remove" => {
            let n = numbers(3)?;
            Step::Remove {
                block: n[0],
                start: n[1],
                end: n[2],
            }
        }
        "key" => {
            let spec = rest.trim();
            let key = match spec {
                "" => return Err(bad("missing key")),
                _ => KeyPress::parse(spec).ok_or_else(|| bad(&format!("unknown key `{spec}`")))?,
            };
            Step::Key(key)
        }
        "run" => {
            let command = rest
                .trim()
                .parse::<Command>()
                .map_err(|err| bad(&err.to_string()))?;
            Step::Run(command)
        }
        "rect" => {
            if args.len() != 6 {
                return Err(bad("expected block, entity, x, y, width, height"));
            }
            let block = args[0]
                .parse()
                .map_err(|_| bad(&format!("`{}` is not a number", args[0])))?;
            let entity = args[1]
                .trim_start_matches('#')
                .parse()
                .map(EntityId::new)
                .map_err(|_| bad(&format!("`{}` is not an entity id", args[1])))?;
            let mut coords = [0.0f32; 4];
            for (slot, arg) in coords.iter_mut().zip(&args[2..]) {
                *slot = arg
                    .parse()
                    .map_err(|_| bad(&format!("`{arg}` is not a coordinate")))?;
            }
            let [x, y, width, height] = coords;
            Step::Rect {
                block,
                entity,
                rect: Rect::new(x, y, width, height),
            }
        }
        other => {
            return Err(ScriptError::UnknownStep {
                line,
                word: other.to_string(),
            });
        }
    };
    Ok(step)
}

/// Runs parsed steps against an editor.
///
/// `show` hands the editor to `on_show`. Invalid edits are ignored by
/// the editor itself; only unknown block indices stop the script.
pub fn run(
    editor: &mut Editor,
    lines: &[Line],
    mut on_show: impl FnMut(&Editor),
) -> Result<(), ScriptError> {
    for Line { number, step } in lines {
        tracing::debug!(line = number, ?step, "running step");
        let block_id = |editor: &Editor, index: usize| {
            editor
                .content()
                .block_at(index)
                .map(|block| block.id())
                .ok_or(ScriptError::NoSuchBlock {
                    line: *number,
                    index,
                })
        };

        match step {
            Step::Type(text) => editor.dispatch_content_edit(ContentEdit::InsertText(text.clone())),
            Step::Enter => editor.dispatch_content_edit(ContentEdit::SplitBlock),
            Step::Backspace => editor.dispatch_content_edit(ContentEdit::DeleteBackward),
            Step::Delete => editor.dispatch_content_edit(ContentEdit::DeleteForward),
            Step::Select {
                block,
                anchor,
                focus,
            } => {
                let block = block_id(editor, *block)?;
                editor.dispatch_selection_change(SelectionRange::new(block, *anchor, *focus));
            }
            Step::Caret { block, offset } => {
                let block = block_id(editor, *block)?;
                editor.dispatch_selection_change(SelectionRange::caret(block, *offset));
            }
            Step::Key(key) => editor.dispatch_key(*key),
            Step::Param => editor.dispatch_parameterize_command(),
            Step::Replace(text) => editor.dispatch_replace_param(text),
            Step::Remove { block, start, end } => {
                let block = block_id(editor, *block)?;
                editor.dispatch_remove_entity(block, *start, *end);
            }
            Step::Run(command) => editor.execute(command.clone()),
            Step::Rect {
                block,
                entity,
                rect,
            } => {
                let block = block_id(editor, *block)?;
                editor.register_entity_render_position(block, *entity, *rect);
            }
            Step::Show => on_show(editor),
        }
    }
    Ok(())
}
