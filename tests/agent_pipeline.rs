//! End-to-end request pipeline with a scripted backend

use anyhow::Result;
use codedrop::engine::{Agent, AgentOptions, AuditWarning, BufferSink, StatusSink, WorkspaceFs};
use codedrop::llm::{LlmError, ScriptedBackend};
use std::sync::Arc;
use tempfile::TempDir;

fn agent_for(temp: &TempDir, backend: Arc<ScriptedBackend>) -> Result<(Agent, Arc<BufferSink>)> {
    let store = WorkspaceFs::open(temp.path(), false)?;
    let sink = Arc::new(BufferSink::new());
    let agent = Agent::new(backend, Box::new(store), AgentOptions::default())
        .with_status_sink(sink.clone() as Arc<dyn StatusSink>);
    Ok((agent, sink))
}

#[tokio::test]
async fn test_new_page_request_with_only_index_warns_twice() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = "\
Here is your updated page.

FILE: index.html
```html
<nav><a href=\"#\">Home</a></nav>
```
";
    let (mut agent, sink) = agent_for(&temp, Arc::new(ScriptedBackend::with_reply(reply)))?;

    let outcome = agent
        .process_request("add a new page with navigation and styling")
        .await;

    assert!(outcome.success, "warnings never fail a request");
    assert_eq!(
        outcome.audit.warnings,
        vec![AuditWarning::MissingCss, AuditWarning::MissingNewPages]
    );
    assert!(outcome.audit.notice().is_some());
    assert!(sink.contains("[OK] All files created successfully!"));
    Ok(())
}

#[tokio::test]
async fn test_repeat_request_reports_unchanged_files() -> Result<()> {
    let temp = TempDir::new()?;
    let reply = "FILE: a.txt\n```\nsame\n```\n";
    let backend = Arc::new(ScriptedBackend::with_reply(reply));
    backend.push_reply(reply);
    let (mut agent, sink) = agent_for(&temp, backend)?;

    assert!(agent.process_request("one").await.success);
    let second = agent.process_request("again").await;

    assert!(second.success);
    assert!(sink.contains("[=] Unchanged: a.txt"));
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_reported_not_raised() -> Result<()> {
    let temp = TempDir::new()?;
    let backend = Arc::new(ScriptedBackend::with_error(LlmError::Timeout {
        duration: std::time::Duration::from_secs(5),
    }));
    let (mut agent, sink) = agent_for(&temp, backend)?;

    let outcome = agent.process_request("slow").await;

    assert!(!outcome.success);
    assert!(outcome.artifacts.is_empty());
    assert!(sink.contains("Error: Failed to get response from backend."));
    assert!(agent.created_files().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_existing_files_travel_with_next_request() -> Result<()> {
    let temp = TempDir::new()?;
    std::fs::write(temp.path().join("index.html"), "<p>old</p>")?;
    std::fs::write(temp.path().join("photo.png"), "binary")?;

    let backend = Arc::new(ScriptedBackend::with_reply(
        "FILE: index.html\n```html\n<p>new</p>\n```\n",
    ));
    let (mut agent, _sink) = agent_for(&temp, backend.clone())?;
    agent.process_request("update the page").await;

    let invocations = backend.invocations();
    let sent = invocations[0].user_message().unwrap_or_default();
    assert!(sent.contains("FILE: index.html\n```\n<p>old</p>\n```"));
    assert!(!sent.contains("photo.png"));
    assert_eq!(std::fs::read_to_string(temp.path().join("index.html"))?, "<p>new</p>");
    Ok(())
}

#[tokio::test]
async fn test_channel_sink_streams_from_background_task() -> Result<()> {
    use codedrop::engine::ChannelSink;

    let temp = TempDir::new()?;
    let backend = Arc::new(ScriptedBackend::with_reply("FILE: x.txt\n```\nx\n```\n"));
    let (mut agent, _) = agent_for(&temp, backend)?;
    let (sink, mut rx) = ChannelSink::new();
    agent.set_status_sink(Arc::new(sink));

    let task = tokio::spawn(async move { agent.process_request("x").await });
    let outcome = task.await?;
    assert!(outcome.success);

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line.text);
    }
    assert!(lines.iter().any(|l| l.contains("Creating 1 file(s)...")));
    Ok(())
}
