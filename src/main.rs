//! # Stencil - Template Text Editor
//!
//! Drives the editor core from a script, for trying out parameters and
//! highlights without a UI.
//!
//! ## Quick Start
//!
//! ```bash
//! # Read steps from stdin
//! echo 'key $' | cargo run
//!
//! # Run a script with known variables, print JSON
//! cargo run -- letter.stencil --variables name,email --json
//! ```

mod script;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stencil_buffer::{RawContent, SelectionRange};
use stencil_core::{Autocomplete, Config, Editor, VariableSet};

/// Stencil - a template text editor core
#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Script to run (stdin if omitted)
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Known variable names offered by autocomplete
    #[arg(long, value_delimiter = ',')]
    variables: Vec<String>,

    /// Config file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective config to the user config file
    #[arg(long)]
    write_config: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Final state in machine-readable form.
#[derive(Serialize)]
struct Snapshot {
    content: RawContent,
    selection: SelectionRange,
    autocomplete: Option<Autocomplete>,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Stencil v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    if args.write_config {
        config.save().context("failed to write config")?;
        tracing::info!("Wrote config to {}", Config::default_path()?.display());
    }

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read script from stdin")?;
            source
        }
    };

    let steps = script::parse(&source).context("invalid script")?;

    let mut editor = Editor::with_config(config);
    editor.set_variables(args.variables.iter().cloned().collect::<VariableSet>());

    script::run(&mut editor, &steps, print_state).context("script failed")?;

    if args.json {
        let snapshot = Snapshot {
            content: editor.content().to_raw(),
            selection: editor.selection(),
            autocomplete: editor.autocomplete(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_state(&editor);
    }

    Ok(())
}

/// Prints decorated blocks, the caret and any autocomplete suggestions.
fn print_state(editor: &Editor) {
    for (index, decoration) in editor.decorations().iter().enumerate() {
        println!("{index}: {}", decoration.markup());
    }

    let selection = editor.selection();
    let index = editor
        .content()
        .block_index(selection.block)
        .unwrap_or_default();
    if selection.is_collapsed() {
        println!("caret: {index}:{}", selection.focus);
    } else {
        println!("selection: {index}:{}..{}", selection.anchor, selection.focus);
    }

    if let Some(popup) = editor.autocomplete() {
        println!("${}: {}", popup.query, popup.suggestions.join(", "));
    }
}
