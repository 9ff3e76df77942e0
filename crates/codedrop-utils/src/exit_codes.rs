//! Process exit codes for the `codedrop` binary.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Request handled, all files written |
//! | 1 | `FAILURE` | Internal failure or a failed batch |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `BACKEND_UNAVAILABLE` | Generation backend could not be reached |

/// Type-safe exit code.
///
/// ```rust
/// use codedrop_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::BACKEND_UNAVAILABLE.as_i32(), 3);
/// assert_eq!(ExitCode::from_i32(0), ExitCode::SUCCESS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error, or at least one artifact failed to write or verify
    pub const FAILURE: ExitCode = ExitCode(1);

    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Backend did not answer the availability probe or the request
    pub const BACKEND_UNAVAILABLE: ExitCode = ExitCode(3);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Exit code for a finished request.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success {
            Self::SUCCESS
        } else {
            Self::FAILURE
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
