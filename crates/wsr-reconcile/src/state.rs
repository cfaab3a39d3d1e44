//! Reconciler state machine
//!
//! A pass observes one of four states and may move a resource along the
//! edges below. `Unknown` has no outgoing edges: the pass reports it and a
//! later pass re-probes from scratch.

use crate::error::ReconcileError;
use serde::Serialize;
use std::fmt;

/// Observed state of one resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Does not exist remotely
    Absent,
    /// Exists and matches the declaration
    PresentConsistent,
    /// Exists but a mutable property differs
    PresentDrifted,
    /// Probe output could not be interpreted
    Unknown,
}

impl ResourceState {
    /// Whether the resource exists remotely
    #[inline]
    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::PresentConsistent | Self::PresentDrifted)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "absent",
            Self::PresentConsistent => "present",
            Self::PresentDrifted => "drifted",
            Self::Unknown => "unknown",
        })
    }
}

/// Validates a state transition.
///
/// # Errors
/// `ReconcileError::IllegalTransition` when `to` is not reachable from `from`.
pub fn validate_transition(from: ResourceState, to: ResourceState) -> Result<(), ReconcileError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ReconcileError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` within one pass
#[must_use]
pub fn allowed_transitions(from: ResourceState) -> Vec<ResourceState> {
    match from {
        // create, then re-probe
        ResourceState::Absent => vec![ResourceState::PresentConsistent, ResourceState::Unknown],
        ResourceState::PresentConsistent => vec![ResourceState::Absent],
        ResourceState::PresentDrifted => {
            vec![ResourceState::PresentConsistent, ResourceState::Absent]
        }
        ResourceState::Unknown => vec![],
    }
}

fn allowed(from: ResourceState, to: ResourceState) -> bool {
    from == to || allowed_transitions(from).into_iter().any(|s| s == to)
}
