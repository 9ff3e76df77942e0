//! CLI tests for the `codedrop` binary
//!
//! None of these need a running backend: `replay` uses a scripted one and
//! the unreachable-backend case points at a closed port.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn codedrop(work_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_codedrop"));
    cmd.current_dir(work_dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

const SAVED: &str = "\
I created the page.

FILE: index.html
```html
<h1>Hello</h1>
```

FILE: styles.css
```css
h1 { color: teal; }
```
";

#[test]
fn test_help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    codedrop(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn test_replay_writes_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("saved.md"), SAVED).unwrap();

    codedrop(temp.path())
        .args(["replay", "saved.md", "-o", "site", "--request", "make a page"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating 2 file(s)..."))
        .stdout(predicate::str::contains("[+] Created: index.html"))
        .stdout(predicate::str::contains("I created the page."));

    assert_eq!(
        fs::read_to_string(temp.path().join("site/styles.css")).unwrap(),
        "h1 { color: teal; }"
    );
}

#[test]
fn test_replay_from_stdin_with_json() {
    let temp = TempDir::new().unwrap();

    let output = codedrop(temp.path())
        .args(["replay", "-", "--json", "-o", "out"])
        .write_stdin(SAVED)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["artifacts"][0]["path"], "index.html");
    assert_eq!(json["report"]["records"][1]["outcome"]["outcome"], "created");
}

#[test]
fn test_replay_warns_on_missing_pages() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("saved.md"),
        "FILE: index.html\n```html\n<p>x</p>\n```\n",
    )
    .unwrap();

    codedrop(temp.path())
        .args(["replay", "saved.md", "--request", "add a new page with navigation and styling"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no CSS file was created"))
        .stdout(predicate::str::contains("at most one HTML file"));
}

#[test]
fn test_replay_escape_attempt_exits_one() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("saved.md"), "FILE: ../up.txt\n```\nx\n```\n").unwrap();

    codedrop(temp.path())
        .args(["replay", "saved.md", "-o", "site"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to create: ../up.txt"));
    assert!(!temp.path().join("up.txt").exists());
}

#[test]
fn test_replay_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    codedrop(temp.path())
        .args(["replay", "nope.md"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read response file"));
}

#[test]
fn test_invalid_config_exits_two() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".codedrop")).unwrap();
    fs::write(
        temp.path().join(".codedrop/config.toml"),
        "[llm.ollama]\nport = 0\n",
    )
    .unwrap();

    codedrop(temp.path())
        .args(["replay", "-"])
        .write_stdin("")
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_backend_exits_three() {
    let temp = TempDir::new().unwrap();
    codedrop(temp.path())
        .args(["run", "hello", "--host", "127.0.0.1", "--port", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not reachable"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let temp = TempDir::new().unwrap();
    codedrop(temp.path())
        .arg("--definitely-not-a-flag")
        .assert()
        .code(2);
}
