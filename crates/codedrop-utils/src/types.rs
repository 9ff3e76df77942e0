use std::fmt;

/// Where an effective configuration value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Set by a command-line flag (highest precedence)
    Cli,
    /// Read from a `.codedrop/config.toml` file
    Config,
    /// Built-in default (lowest precedence)
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Default => write!(f, "default"),
        }
    }
}
