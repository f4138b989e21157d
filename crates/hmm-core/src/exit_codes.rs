//! Exit codes for the `hmm` CLI.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (not errors)
//! - 10-19: User input errors (fixable by changing arguments, files or settings)
//! - 20-29: Internal and environment errors

use hmm_common::Error;

/// Exit codes for `hmm` operations.
///
/// These codes are a stable contract for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Success
    Clean = 0,

    /// Training stopped at the iteration budget without converging
    NotConverged = 1,

    // ========================================================================
    // User Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Model or emission sequence is malformed or inconsistent
    InvalidInput = 11,

    /// Training settings could not be loaded or validated
    ConfigError = 12,

    /// Re-estimation hit a state with zero expected occupancy
    DegenerateModel = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-1: the command ran to completion.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Codes 10-19: resolvable by the user.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NotConverged => "OK_NOT_CONVERGED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InvalidInput => "ERR_INVALID_INPUT",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DegenerateModel => "ERR_DEGENERATE_MODEL",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidSettings(_) => ExitCode::ConfigError,
            Error::InvalidModel(_)
            | Error::InvalidSequence(_)
            | Error::Container(_)
            | Error::Inference(_) => ExitCode::InvalidInput,
            Error::DegenerateModel(_) => ExitCode::DegenerateModel,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
