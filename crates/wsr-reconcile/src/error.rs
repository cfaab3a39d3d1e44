//! Error types for reconciliation and tool configuration

use crate::state::ResourceState;
use std::path::PathBuf;
use wsr_admin::RunnerError;
use wsr_schema::{ResourceKind, SchemaError};

/// A reconciliation pass could not complete
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Declaration failed schema validation
    #[error("invalid declaration: {0}")]
    Schema(#[from] SchemaError),

    /// An identity key differs between declaration and remote state.
    ///
    /// Identity keys are immutable; this is a configuration error and is
    /// never repaired by destroying and recreating.
    #[error("{resource}: identity key '{attribute}' is '{observed}' remotely but declared '{desired}'")]
    IdentityDrift {
        /// Resource as declared
        resource: String,
        /// Identity key that differs
        attribute: &'static str,
        /// Declared value
        desired: String,
        /// Value found remotely
        observed: String,
    },

    /// The Command Executor could not run a command
    #[error("transport failure: {0}")]
    Transport(#[from] RunnerError),

    /// Internal state-machine violation
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// State before
        from: ResourceState,
        /// Attempted state
        to: ResourceState,
    },
}

impl ReconcileError {
    /// Errors that a re-run cannot fix without changing the declaration
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::IdentityDrift { .. })
    }

    /// Whether a command may have taken effect despite the error
    #[must_use]
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_outcome_unknown())
    }
}

/// Loading configuration or a catalog failed
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Tool configuration is not valid TOML for [`crate::ToolConfig`]
    #[error("invalid configuration {}: {source}", path.display())]
    Toml {
        /// File path
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// Catalog is not valid YAML for the catalog layout
    #[error("invalid catalog {}: {source}", path.display())]
    Yaml {
        /// File path
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// A catalog entry failed schema validation
    #[error("{kind} entry #{index}: {source}")]
    Declaration {
        /// Which list the entry is in
        kind: ResourceKind,
        /// Zero-based position in that list
        index: usize,
        /// Validation failure
        #[source]
        source: SchemaError,
    },

    /// Two catalog entries address the same resource
    #[error("{kind} {key} is declared more than once")]
    Duplicate {
        /// Resource kind
        kind: ResourceKind,
        /// Identity of the duplicate
        key: String,
    },

    /// Worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
