use std::path::PathBuf;

/// Configuration overrides taken from the command line
///
/// `None` and `false` mean "not given"; they never override a file value.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file, skips discovery
    pub config_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
    pub allow_links: bool,
    /// Disable the existing-files context block
    pub no_context: bool,
}
