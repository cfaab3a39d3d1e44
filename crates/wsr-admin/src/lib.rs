//! WSR Admin
//!
//! Everything that talks to wsadmin.
//!
//! # Overview
//!
//! - **AdminSessionRunner**: the Command Executor capability; runs one command
//!   as one OS user and returns raw text
//! - **command**: renders administrative commands from typed identity and values
//! - **AdminResponse**: separates wsadmin status messages from returned values
//! - **StateProber**: turns returned text into [`Observation`]s
//! - **WsadminRunner**: the production executor
//!
//! # Example
//!
//! ```rust
//! use wsr_admin::probe::{parse_existence, Observation};
//!
//! let out = "test_cluster(cells/dmgrCell01/clusters/test_cluster|cluster.xml#ServerCluster_1)";
//! assert_eq!(parse_existence(out, "test_cluster"), Observation::Known(true));
//! assert_eq!(parse_existence("", "test_cluster"), Observation::Known(false));
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod config_id;
pub mod error;
pub mod probe;
pub mod response;
pub mod runner;
pub mod wsadmin;

// Re-exports
pub use command::{AdminCommand, Verb, SAVE_STATEMENT};
pub use config_id::ConfigId;
pub use error::{AmbiguousStateError, RunnerError};
pub use probe::{MemberLocation, Observation, ObservedMember, StateProber};
pub use response::{AdminResponse, Message, Severity};
pub use runner::{AdminSessionRunner, SessionFactory};
pub use wsadmin::{WsadminConfig, WsadminRunner, WsadminSessionFactory};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for probing and executing
    pub use crate::{
        AdminCommand, AdminSessionRunner, AmbiguousStateError, Observation, RunnerError,
        SessionFactory, StateProber,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
