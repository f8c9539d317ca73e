//! CLI error types and exit codes.

use thiserror::Error;

/// Exit codes:
/// - 0: success (including the no-op fast path)
/// - 1: reconciliation or transport failure
/// - 2: configuration error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secret resolution failed: {0}")]
    Secrets(String),

    #[error(transparent)]
    Gws(#[from] dirsync_gws::GwsError),

    #[error(transparent)]
    Scim(#[from] dirsync_scim::ScimError),

    #[error(transparent)]
    State(#[from] dirsync_state::StateError),

    #[error(transparent)]
    Sync(#[from] dirsync_core::SyncError),
}

impl CliError {
    /// Map the error class to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }

    /// Print the error to stderr.
    pub fn print(&self) {
        if std::env::var("NO_COLOR").is_err() {
            eprintln!("\x1b[31merror:\x1b[0m {self}");
        } else {
            eprintln!("error: {self}");
        }
    }
}
