//! Error taxonomy for codedrop
//!
//! Each crate-level error enum implements [`UserFriendlyError`] so the CLI can
//! render a message, some context, and concrete next steps without matching
//! on variants itself.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error for the codedrop binary and library facade
#[derive(Error, Debug)]
pub enum CodedropError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Backend,
    FileSystem,
    Security,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Backend => write!(f, "Backend"),
            Self::FileSystem => write!(f, "File System"),
            Self::Security => write!(f, "Security"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Could not read the configuration file: {msg}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration key '{key}' has an invalid value: {value}")
            }
            Self::MissingRequired(key) => format!("Configuration key '{key}' is required"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "codedrop reads .codedrop/config.toml from the current directory or a parent."
                    .to_string(),
            ),
            Self::InvalidValue { .. } | Self::MissingRequired(_) => Some(
                "Values come from CLI flags first, then the config file, then built-in defaults."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the file for TOML syntax errors".to_string(),
                "Pass --config <path> to use a different file".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![
                format!("Fix '{key}' in .codedrop/config.toml or override it with a CLI flag"),
                "Run with /config in the interactive loop to see effective values".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!("Add '{key}' to the config file")],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors from the generation backend transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Authentication or authorization failure
    #[error("authentication failed: {0}")]
    ProviderAuth(String),

    /// Rate limit or quota exceeded
    #[error("quota exceeded: {0}")]
    ProviderQuota(String),

    /// Backend-side outage
    #[error("backend outage: {0}")]
    ProviderOutage(String),

    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Missing or invalid backend settings
    #[error("misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Backend answered but the reply carried no text
    #[error("backend returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// True when the error means the backend could not be reached at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::ProviderOutage(_)
        )
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Could not reach the backend: {msg}"),
            Self::ProviderAuth(msg) => format!("Backend rejected the request: {msg}"),
            Self::ProviderQuota(msg) => format!("Backend quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("Backend is failing: {msg}"),
            Self::Timeout { duration } => {
                format!("Backend did not answer within {}s", duration.as_secs())
            }
            Self::Misconfiguration(msg) => format!("Backend configuration error: {msg}"),
            Self::Unsupported(msg) => format!("Backend feature not supported: {msg}"),
            Self::EmptyResponse => "Backend returned an empty response".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => {
                Some("codedrop talks to a local Ollama server over HTTP.".to_string())
            }
            Self::Timeout { .. } => {
                Some("Large models can take minutes to produce a full response.".to_string())
            }
            Self::EmptyResponse => Some(
                "The model may not be loaded, or the reply envelope had no content field."
                    .to_string(),
            ),
            Self::ProviderAuth(_)
            | Self::ProviderQuota(_)
            | Self::Misconfiguration(_)
            | Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Start the server with 'ollama serve'".to_string(),
                "Check --host and --port".to_string(),
            ],
            Self::Timeout { .. } => vec!["Raise the limit with --timeout <secs>".to_string()],
            Self::EmptyResponse => vec![
                "Pull the model with 'ollama pull <model>'".to_string(),
                "Pick another model with --model".to_string(),
            ],
            Self::ProviderAuth(_) => vec!["Check the server's access settings".to_string()],
            Self::ProviderQuota(_) => vec!["Wait and retry".to_string()],
            Self::Misconfiguration(_) | Self::Unsupported(_) => {
                vec!["Review the [llm] section of .codedrop/config.toml".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) | Self::Unsupported(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Backend,
        }
    }
}

/// Errors from resolving and writing paths inside the output directory
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Absolute path not allowed: {path}")]
    AbsolutePath { path: String },

    #[error("Path contains parent directory traversal: {path}")]
    ParentDirEscape { path: String },

    #[error("Path escapes output directory: {path} resolves outside {root}")]
    OutsideRoot { path: String, root: String },

    #[error("Symlink not allowed: {path}")]
    SymlinkNotAllowed { path: String },

    #[error("Hardlink not allowed: {path}")]
    HardlinkNotAllowed { path: String },

    #[error("Output directory unavailable: {path}: {reason}")]
    RootUnavailable { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    /// True for path-policy rejections, as opposed to I/O failures.
    #[must_use]
    pub fn is_containment_violation(&self) -> bool {
        matches!(
            self,
            Self::AbsolutePath { .. }
                | Self::ParentDirEscape { .. }
                | Self::OutsideRoot { .. }
                | Self::SymlinkNotAllowed { .. }
                | Self::HardlinkNotAllowed { .. }
        )
    }
}

impl UserFriendlyError for WorkspaceError {
    fn user_message(&self) -> String {
        match self {
            Self::RootUnavailable { path, reason } => {
                format!("Cannot use '{path}' as the output directory: {reason}")
            }
            other => other.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        if self.is_containment_violation() {
            Some("Generated files may only be written inside the output directory.".to_string())
        } else {
            None
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::SymlinkNotAllowed { .. } | Self::HardlinkNotAllowed { .. } => {
                vec!["Pass --allow-links to permit links inside the output directory".to_string()]
            }
            Self::AbsolutePath { .. } | Self::ParentDirEscape { .. } | Self::OutsideRoot { .. } => {
                vec!["Ask the model for paths relative to the project root".to_string()]
            }
            Self::RootUnavailable { .. } => {
                vec!["Choose a writable directory with --output <dir>".to_string()]
            }
            Self::WriteFailed { .. } | Self::Io { .. } => {
                vec!["Check permissions and free space in the output directory".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        if self.is_containment_violation() {
            ErrorCategory::Security
        } else {
            ErrorCategory::FileSystem
        }
    }
}

impl UserFriendlyError for CodedropError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Workspace(e) => e.user_message(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Workspace(e) => e.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Workspace(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Workspace(e) => e.category(),
        }
    }
}

impl CodedropError {
    /// Render the error with context and suggestions.
    ///
    /// ```text
    /// Error: <message>
    ///
    /// Context: <context>
    ///
    /// Suggestions:
    ///   • <suggestion>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Llm(e) if e.is_unavailable() => ExitCode::BACKEND_UNAVAILABLE,
            Self::Llm(LlmError::Misconfiguration(_) | LlmError::Unsupported(_)) => {
                ExitCode::CLI_ARGS
            }
            Self::Workspace(WorkspaceError::RootUnavailable { .. }) => ExitCode::CLI_ARGS,
            _ => ExitCode::FAILURE,
        }
    }
}
