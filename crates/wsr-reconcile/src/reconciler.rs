//! Cluster and member reconcilers
//!
//! A pass is probe, plan, apply and, after a create, re-probe. Both
//! reconcilers borrow an [`AdminSessionRunner`] and never share it with
//! another resource.
//!
//! Mutations are provisionally successful: wsadmin exits 0 either way, so an
//! error printed in response to a mutation is logged and recorded but not
//! acted on. The next pass re-probes and sees whether it took.

use crate::config::ReconcilerConfig;
use crate::error::ReconcileError;
use crate::plan::{plan_cluster, plan_member, Plan, StepAction};
use crate::report::{PassId, PassOutcome, PassReport};
use crate::state::{validate_transition, ResourceState};
use wsr_admin::{AdminCommand, AdminResponse, AdminSessionRunner, Observation, RunnerError, StateProber};
use wsr_schema::{ClusterMemberResource, ClusterResource, Ensure, ResourceKind};

fn submit<R: AdminSessionRunner + ?Sized>(
    runner: &R,
    user: &str,
    command: &AdminCommand,
    report: &mut PassReport,
) -> Result<(), RunnerError> {
    tracing::info!(verb = ?command.verb(), command = %command, "submitting");
    report.commands.push(command.clone());
    let raw = runner.execute(&command.script(), user)?;
    if let Some(message) = AdminResponse::parse(&raw).error() {
        tracing::warn!(
            code = %message.code,
            message = %message.line,
            "wsadmin reported an error; the next pass will re-probe"
        );
        report.warnings.push(message.line.clone());
    }
    Ok(())
}

fn mark_unknown(report: &mut PassReport, reason: String) {
    tracing::warn!(%reason, "state unknown; no further mutation this pass");
    report.after = ResourceState::Unknown;
    report.outcome = PassOutcome::Unknown { reason };
}

/// Record the observed state. Returns `false` when the pass ends here:
/// unknown state, nothing to do, or dry run.
fn begin_apply(report: &mut PassReport, plan: &Plan, dry_run: bool) -> bool {
    report.before = plan.state;
    tracing::info!(state = %plan.state, steps = plan.steps.len(), "planned");
    if let Some(reason) = &plan.reason {
        mark_unknown(report, reason.clone());
        return false;
    }
    report.after = plan.state;
    if plan.is_noop() {
        report.outcome = PassOutcome::Converged;
        return false;
    }
    if dry_run {
        report.planned = plan.steps.clone();
        report.outcome = PassOutcome::Planned;
        return false;
    }
    true
}

fn finish(
    mut report: PassReport,
    result: Result<(), ReconcileError>,
) -> Result<PassReport, ReconcileError> {
    match result {
        Ok(()) => {
            tracing::info!(
                before = %report.before,
                after = %report.after,
                outcome = %report.outcome,
                commands = report.commands.len(),
                "pass finished"
            );
            Ok(report)
        }
        Err(e) if e.is_outcome_unknown() => {
            mark_unknown(&mut report, e.to_string());
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "pass failed");
            Err(e)
        }
    }
}

fn settle(report: &mut PassReport, after: ResourceState) -> Result<(), ReconcileError> {
    validate_transition(report.before, after)?;
    report.after = after;
    if after != ResourceState::Unknown {
        report.outcome = PassOutcome::Changed;
    }
    Ok(())
}

/// Reconciles `websphere_cluster` resources
pub struct ClusterReconciler<'r, R: AdminSessionRunner + ?Sized> {
    runner: &'r R,
    config: &'r ReconcilerConfig,
}

impl<'r, R: AdminSessionRunner + ?Sized> ClusterReconciler<'r, R> {
    /// Reconcile through `runner`
    pub fn new(runner: &'r R, config: &'r ReconcilerConfig) -> Self {
        Self { runner, config }
    }

    /// Run one pass for `desired`.
    ///
    /// # Errors
    /// `ReconcileError::Transport` when a command could not be run. A timed
    /// out command is reported as an `Unknown` outcome instead.
    pub fn reconcile(&self, desired: &ClusterResource) -> Result<PassReport, ReconcileError> {
        let pass_id = PassId::new();
        let span = tracing::info_span!(
            "reconcile",
            pass_id = %pass_id,
            kind = "cluster",
            resource = %desired.name
        );
        let _enter = span.enter();

        let mut report = PassReport::begin(pass_id, ResourceKind::Cluster, desired.name.as_str());
        let result = self.pass(desired, &mut report);
        finish(report, result)
    }

    fn pass(&self, desired: &ClusterResource, report: &mut PassReport) -> Result<(), ReconcileError> {
        let user = desired.user();
        let prober = StateProber::new(self.runner, user);
        let plan = plan_cluster(desired, &prober.cluster_exists(&desired.name)?);
        if !begin_apply(report, &plan, self.config.dry_run) {
            return Ok(());
        }

        let mut created = false;
        for step in &plan.steps {
            submit(self.runner, user, &step.command, report)?;
            created |= step.action == StepAction::CreateCluster;
        }

        let after = if created && self.config.verify_after_create {
            match prober.cluster_exists(&desired.name)? {
                Observation::Known(true) => ResourceState::PresentConsistent,
                Observation::Known(false) => {
                    mark_unknown(report, "cluster not found after create".to_string());
                    ResourceState::Unknown
                }
                Observation::Unknown(e) => {
                    mark_unknown(report, e.to_string());
                    ResourceState::Unknown
                }
            }
        } else {
            plan.target(desired.ensure)
        };
        settle(report, after)
    }
}

/// Reconciles `websphere_cluster_member` resources
pub struct MemberReconciler<'r, R: AdminSessionRunner + ?Sized> {
    runner: &'r R,
    config: &'r ReconcilerConfig,
}

impl<'r, R: AdminSessionRunner + ?Sized> MemberReconciler<'r, R> {
    /// Reconcile through `runner`
    pub fn new(runner: &'r R, config: &'r ReconcilerConfig) -> Self {
        Self { runner, config }
    }

    /// Run one pass for `desired`.
    ///
    /// # Errors
    /// `ReconcileError::IdentityDrift` when the member exists with different
    /// identity keys; `ReconcileError::Transport` when a command could not be
    /// run.
    pub fn reconcile(&self, desired: &ClusterMemberResource) -> Result<PassReport, ReconcileError> {
        let pass_id = PassId::new();
        let span = tracing::info_span!(
            "reconcile",
            pass_id = %pass_id,
            kind = "cluster_member",
            resource = %desired.identity
        );
        let _enter = span.enter();

        let mut report = PassReport::begin(
            pass_id,
            ResourceKind::ClusterMember,
            desired.identity.to_string(),
        );
        let result = self.pass(desired, &mut report);
        finish(report, result)
    }

    fn pass(&self, desired: &ClusterMemberResource, report: &mut PassReport) -> Result<(), ReconcileError> {
        let user = desired.user();
        let include_defaulted = self.config.manage_defaults;
        let prober = StateProber::new(self.runner, user);

        let read_properties = desired.ensure == Ensure::Present;
        let observed = prober.observe_member(desired, read_properties, include_defaulted)?;
        let plan = plan_member(desired, &observed, include_defaulted)?;
        if !begin_apply(report, &plan, self.config.dry_run) {
            return Ok(());
        }

        let mut created = false;
        for step in &plan.steps {
            submit(self.runner, user, &step.command, report)?;
            created |= step.action == StepAction::CreateMember;
        }

        if !created || !self.config.verify_after_create {
            return settle(report, plan.target(desired.ensure));
        }

        // New members start from server defaults; converge properties now.
        let observed = prober.observe_member(desired, true, include_defaulted)?;
        let after = match &observed {
            Observation::Known(Some(_)) => {
                let follow = plan_member(desired, &observed, include_defaulted)?;
                for step in &follow.steps {
                    submit(self.runner, user, &step.command, report)?;
                }
                ResourceState::PresentConsistent
            }
            Observation::Known(None) => {
                mark_unknown(report, "member not found after create".to_string());
                ResourceState::Unknown
            }
            Observation::Unknown(e) => {
                mark_unknown(report, e.to_string());
                ResourceState::Unknown
            }
        };
        settle(report, after)
    }
}
