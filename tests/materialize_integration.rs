//! Materializer against a real directory

use anyhow::Result;
use codedrop::engine::materialize::materialize;
use codedrop::engine::parse::parse;
use codedrop::engine::{FileStore, WorkspaceFs, WriteOutcome};
use tempfile::TempDir;

const RESPONSE: &str = "\
FILE: index.html
```html
<!DOCTYPE html>
<html>
  <body>Hello</body>
</html>
```

FILE: css/site.css
```css
body {
    margin: 0;
}
```

```javascript
console.log('no name');
```
";

#[test]
fn test_second_pass_is_unchanged_for_every_artifact() -> Result<()> {
    let temp = TempDir::new()?;
    let store = WorkspaceFs::open(temp.path(), false)?;
    let artifacts = parse(RESPONSE).artifacts;
    assert_eq!(artifacts.len(), 3);

    let first = materialize(&store, &artifacts);
    assert!(first.success());
    assert!(first.records.iter().all(|r| r.outcome == WriteOutcome::Created));

    let second = materialize(&store, &artifacts);
    assert!(second.success());
    assert!(second
        .records
        .iter()
        .all(|r| r.outcome == WriteOutcome::UnchangedWarning && r.existed_before));
    assert_eq!(second.created_files, vec!["index.html", "css/site.css", "script.js"]);
    Ok(())
}

#[test]
fn test_written_bytes_match_parsed_content() -> Result<()> {
    let temp = TempDir::new()?;
    let store = WorkspaceFs::open(temp.path(), false)?;
    materialize(&store, &parse(RESPONSE).artifacts);

    let css = std::fs::read_to_string(temp.path().join("css").join("site.css"))?;
    assert_eq!(css, "body {\n    margin: 0;\n}");
    assert_eq!(store.read_file("script.js"), "console.log('no name');");
    Ok(())
}

#[test]
fn test_containment_violations_become_write_failures() -> Result<()> {
    let temp = TempDir::new()?;
    let project = temp.path().join("project");
    let store = WorkspaceFs::open(&project, false)?;
    let response = "\
FILE: ../outside.txt
```
escape
```
FILE: inside/ok.txt
```
fine
```
";
    let report = materialize(&store, &parse(response).artifacts);

    assert!(!report.success());
    assert!(matches!(
        &report.records[0].outcome,
        WriteOutcome::WriteFailed { error } if error.contains("outside.txt")
    ));
    assert_eq!(report.records[1].outcome, WriteOutcome::Created);
    assert!(!temp.path().join("outside.txt").exists());
    assert!(project.join("inside/ok.txt").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_rejected_without_allow_links() -> Result<()> {
    let temp = TempDir::new()?;
    let outside = TempDir::new()?;
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project)?;
    std::os::unix::fs::symlink(outside.path(), project.join("link"))?;

    let store = WorkspaceFs::open(&project, false)?;
    let response = "FILE: link/evil.txt\n```\nx\n```\n";
    let report = materialize(&store, &parse(response).artifacts);

    assert!(!report.success());
    assert!(!outside.path().join("evil.txt").exists());
    Ok(())
}

#[test]
fn test_utf8_and_crlf_content_round_trips() -> Result<()> {
    let temp = TempDir::new()?;
    let store = WorkspaceFs::open(temp.path(), false)?;
    let response = "FILE: notes.md\r\n```md\r\n# Überschrift\r\nzwei\r\n```\r\n";
    let artifacts = parse(response).artifacts;
    let report = materialize(&store, &artifacts);

    assert_eq!(report.records[0].outcome, WriteOutcome::Created);
    assert_eq!(store.read_file("notes.md"), "# Überschrift\nzwei");
    Ok(())
}
