//! Error types for command execution and probing
//!
//! Only transport-level problems are errors here. A remote operation that
//! failed logically still "succeeds" as far as wsadmin is concerned; that
//! shows up as text, and text is judged by the prober.

use std::path::PathBuf;
use std::time::Duration;

/// The Command Executor could not run a command at all
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// wsadmin script not found
    #[error("wsadmin not found at {}", path.display())]
    ToolNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// The session has no profile directory to run from
    #[error("no profile directory for session: {0}")]
    MissingProfile(String),

    /// The process could not be spawned
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// wsadmin started but could not connect to a server process
    #[error("administrative session unavailable: {marker}")]
    SessionUnavailable {
        /// The message that gave it away
        marker: String,
    },

    /// Reading the process output failed
    #[error("I/O error talking to wsadmin: {0}")]
    Io(#[from] std::io::Error),

    /// The caller-level timeout fired before wsadmin returned
    #[error("wsadmin did not return within {}s", timeout.as_secs())]
    TimedOut {
        /// Configured limit
        timeout: Duration,
    },
}

impl RunnerError {
    /// Whether the command may or may not have taken effect.
    ///
    /// A timed-out invocation was killed mid-flight; the remote side may
    /// have applied it. Every other variant means nothing ran.
    #[inline]
    #[must_use]
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Probe output that could not be parsed with confidence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmbiguousStateError {
    /// wsadmin printed an error message instead of a result
    #[error("wsadmin reported {code}: {message}")]
    RemoteError {
        /// Message code, e.g. `WASX7017E`
        code: String,
        /// Full message line
        message: String,
    },

    /// Output was neither empty nor recognizably about the queried object
    #[error("unexpected output for {query}: {output:?}")]
    UnexpectedOutput {
        /// What was being asked
        query: String,
        /// What came back (banner lines stripped)
        output: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeout_is_unknown_outcome() {
        assert!(RunnerError::TimedOut {
            timeout: Duration::from_secs(5)
        }
        .is_outcome_unknown());
        assert!(!RunnerError::ToolNotFound {
            path: PathBuf::from("/opt/wsadmin.sh")
        }
        .is_outcome_unknown());
        assert!(!RunnerError::SessionUnavailable {
            marker: "WASX7023E".into()
        }
        .is_outcome_unknown());
    }
}
