//! Tracing setup for the `codedrop` binary
//!
//! Library crates only emit `tracing` events; the binary decides where they
//! go. `RUST_LOG` always wins over the verbosity flag.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Colors only on a TTY and when `NO_COLOR` is unset.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "codedrop=debug,info"
    } else {
        "codedrop=info,warn"
    }
}

/// Install the global tracing subscriber.
///
/// Events go to stderr so they never interleave with generated output on
/// stdout. Fails if a subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_color())
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
