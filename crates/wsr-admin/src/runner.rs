//! Command Executor contract
//!
//! `AdminSessionRunner` is the capability the cluster and member reconcilers
//! are given. It runs one scripting command as one OS user and returns raw
//! standard output. Exit status carries no meaning and is not part of the
//! contract.

use crate::error::RunnerError;
use wsr_schema::SessionContext;

/// Runs administrative scripting commands
#[cfg_attr(test, mockall::automock)]
pub trait AdminSessionRunner: Send {
    /// Execute `command` as `user` and return raw output text.
    ///
    /// # Errors
    /// Only when the command could not be run at all (tool missing, session
    /// not establishable, timed out). Logical failure of the remote
    /// operation is never an error here.
    fn execute(&self, command: &str, user: &str) -> Result<String, RunnerError>;
}

/// Opens one administrative session per resource
///
/// Sessions are never shared between concurrently reconciled resources.
pub trait SessionFactory: Sync {
    /// Runner type produced
    type Runner: AdminSessionRunner;

    /// Open a session for `context`
    ///
    /// # Errors
    /// `RunnerError` when the context cannot yield a session (e.g. no profile).
    fn open(&self, context: &SessionContext) -> Result<Self::Runner, RunnerError>;
}
