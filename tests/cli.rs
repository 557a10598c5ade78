//! Runs the `stencil` binary against script files.

use std::path::Path;
use std::process::{Command, Output};

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn stencil(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stencil"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn prints_markup_and_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", "");
    let script = write(dir.path(), "letter.stencil", "# greeting\nkey $\ntype na\n");

    let output = stencil(&[
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--variables",
        "name,nation,email",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("0: {$na }"), "{stdout}");
    assert!(stdout.contains("caret: 0:3"), "{stdout}");
    assert!(stdout.contains("$na: name, nation"), "{stdout}");
}

#[test]
fn prints_json_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "[autocomplete]\nmax_suggestions = 1\n",
    );
    let script = write(dir.path(), "letter.stencil", "key $\ntype na\n");

    let output = stencil(&[
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--variables",
        "name,nation",
        "--json",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["content"]["blocks"][0]["text"], "$na ");
    assert_eq!(json["selection"]["focus"], 3);
    assert_eq!(json["autocomplete"]["suggestions"], serde_json::json!(["name"]));
}

#[test]
fn bad_script_fails_with_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", "");
    let script = write(dir.path(), "broken.stencil", "type ok\nwiggle\n");

    let output = stencil(&[
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("line 2"), "{stderr}");
}

#[test]
#[cfg(target_os = "linux")]
fn writes_effective_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", "[autocomplete]\nmax_suggestions = 3\n");
    let script = write(dir.path(), "empty.stencil", "");
    let home = dir.path().join("home");

    let output = Command::new(env!("CARGO_BIN_EXE_stencil"))
        .args([
            script.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--write-config",
        ])
        .env("XDG_CONFIG_HOME", &home)
        .output()
        .unwrap();
    assert!(output.status.success());

    let written = std::fs::read_to_string(home.join("stencil").join("config.toml")).unwrap();
    assert!(written.contains("max_suggestions = 3"), "{written}");
}
