//! Reconciliation plans
//!
//! Planning is a pure function of the declaration and a fresh observation.
//! A plan lists the commands needed to converge, one command per step.

use crate::diff::{identity_drift, member_drift};
use crate::error::ReconcileError;
use crate::state::ResourceState;
use serde::Serialize;
use wsr_admin::command;
use wsr_admin::{AdminCommand, Observation, ObservedMember};
use wsr_schema::{ClusterMemberResource, ClusterResource, Ensure, ScriptValue};

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Create the cluster
    CreateCluster,
    /// Delete the cluster
    DeleteCluster,
    /// Create the member with its creation options
    CreateMember,
    /// Remove the member from its cluster
    DeleteMember,
    /// Write one mutable property
    SetProperty {
        /// Attribute name
        property: &'static str,
        /// Value found, `None` when unset
        from: Option<String>,
        /// Value written
        to: ScriptValue,
    },
}

/// One planned administrative command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// What the step does
    #[serde(flatten)]
    pub action: StepAction,
    /// Command that does it
    pub command: AdminCommand,
}

/// Steps that move one resource from its observed state to its declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Observed state
    pub state: ResourceState,
    /// Why the state is unknown, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Commands to issue, in order
    pub steps: Vec<PlannedStep>,
}

impl Plan {
    fn unknown(reason: String) -> Self {
        Self {
            state: ResourceState::Unknown,
            reason: Some(reason),
            steps: Vec::new(),
        }
    }

    fn of(state: ResourceState) -> Self {
        Self {
            state,
            reason: None,
            steps: Vec::new(),
        }
    }

    fn step(mut self, action: StepAction, command: AdminCommand) -> Self {
        self.steps.push(PlannedStep { action, command });
        self
    }

    /// Nothing to do
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    /// State the resource is in once every step has been applied.
    ///
    /// `Unknown` stays `Unknown`; nothing is applied for it.
    #[must_use]
    pub fn target(&self, ensure: Ensure) -> ResourceState {
        match (self.state, ensure) {
            (ResourceState::Unknown, _) => ResourceState::Unknown,
            (_, Ensure::Absent) => ResourceState::Absent,
            (_, Ensure::Present) => ResourceState::PresentConsistent,
        }
    }
}

/// Plan a cluster from an existence observation
#[must_use]
pub fn plan_cluster(desired: &ClusterResource, observed: &Observation<bool>) -> Plan {
    match (observed, desired.ensure) {
        (Observation::Unknown(e), _) => Plan::unknown(e.to_string()),
        (Observation::Known(false), Ensure::Present) => Plan::of(ResourceState::Absent)
            .step(StepAction::CreateCluster, command::create_cluster(&desired.name)),
        (Observation::Known(false), Ensure::Absent) => Plan::of(ResourceState::Absent),
        (Observation::Known(true), Ensure::Present) => Plan::of(ResourceState::PresentConsistent),
        (Observation::Known(true), Ensure::Absent) => Plan::of(ResourceState::PresentConsistent)
            .step(StepAction::DeleteCluster, command::delete_cluster(&desired.name)),
    }
}

/// Plan a member from a full observation.
///
/// # Errors
/// `ReconcileError::IdentityDrift` if the member exists but any identity key
/// differs; no steps are planned in that case.
pub fn plan_member(
    desired: &ClusterMemberResource,
    observed: &Observation<Option<ObservedMember>>,
    include_defaulted: bool,
) -> Result<Plan, ReconcileError> {
    let current = match observed {
        Observation::Unknown(e) => return Ok(Plan::unknown(e.to_string())),
        Observation::Known(None) => {
            let plan = Plan::of(ResourceState::Absent);
            return Ok(match desired.ensure {
                Ensure::Present => {
                    let options: Vec<_> = desired.create_options().collect();
                    plan.step(
                        StepAction::CreateMember,
                        command::create_member(&desired.identity, &options),
                    )
                }
                Ensure::Absent => plan,
            });
        }
        Observation::Known(Some(current)) => current,
    };

    if let Some((attribute, want, found)) = identity_drift(&desired.identity, current) {
        return Err(ReconcileError::IdentityDrift {
            resource: desired.identity.to_string(),
            attribute,
            desired: want.to_string(),
            observed: found.to_string(),
        });
    }

    let drift = member_drift(desired, current, include_defaulted);
    let state = if drift.is_empty() {
        ResourceState::PresentConsistent
    } else {
        ResourceState::PresentDrifted
    };

    let mut plan = Plan::of(state);
    match desired.ensure {
        Ensure::Absent => {
            plan = plan.step(StepAction::DeleteMember, command::delete_member(&desired.identity));
        }
        Ensure::Present => {
            for d in drift {
                let cmd = command::set_property(&desired.identity, &d.path, &d.desired);
                plan = plan.step(
                    StepAction::SetProperty {
                        property: d.property,
                        from: d.observed,
                        to: d.desired,
                    },
                    cmd,
                );
            }
        }
    }
    Ok(plan)
}
