//! Status channel: human-readable lines for the user
//!
//! Separate from tracing. The engine reports progress and outcomes through a
//! [`StatusSink`]; front ends choose where the lines go.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// One line sent through a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub text: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub trait StatusSink: Send + Sync {
    fn emit(&self, line: &str);

    /// Failure lines. Defaults to [`StatusSink::emit`].
    fn error(&self, line: &str) {
        self.emit(line);
    }
}

/// Info to stdout, errors to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl StatusSink for StdoutSink {
    fn emit(&self, line: &str) {
        println!("{line}");
    }

    fn error(&self, line: &str) {
        eprintln!("{line}");
    }
}

type Callback = Box<dyn Fn(StatusLevel, &str) + Send + Sync>;

/// Forwards every line to a caller closure
pub struct CallbackSink {
    callback: Callback,
}

impl CallbackSink {
    pub fn new(callback: impl Fn(StatusLevel, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

impl StatusSink for CallbackSink {
    fn emit(&self, line: &str) {
        (self.callback)(StatusLevel::Info, line);
    }

    fn error(&self, line: &str) {
        (self.callback)(StatusLevel::Error, line);
    }
}

/// Sends lines to a receiver, typically drained on another task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusLine>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, level: StatusLevel, line: &str) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(StatusLine {
            level,
            text: line.to_string(),
        });
    }
}

impl StatusSink for ChannelSink {
    fn emit(&self, line: &str) {
        self.send(StatusLevel::Info, line);
    }

    fn error(&self, line: &str) {
        self.send(StatusLevel::Error, line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<StatusLine>>,
}

impl BufferSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of every line so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|l| l.text).collect()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<StatusLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, level: StatusLevel, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(StatusLine {
                level,
                text: line.to_string(),
            });
        }
    }
}

impl StatusSink for BufferSink {
    fn emit(&self, line: &str) {
        self.push(StatusLevel::Info, line);
    }

    fn error(&self, line: &str) {
        self.push(StatusLevel::Error, line);
    }
}
