use std::process::ExitStatus;
use thiserror::Error;

/// Errors from metric sources that reach outside the process.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to launch `{tool}`: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` did not finish within {timeout_secs}s")]
    Timeout { tool: &'static str, timeout_secs: u64 },

    #[error("`{tool}` exited with {status}: {detail}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        detail: String,
    },

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CollectError>;
