//! Pass reports

use crate::plan::PlannedStep;
use crate::state::ResourceState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use wsr_admin::AdminCommand;
use wsr_schema::ResourceKind;

/// Identifies one reconciliation pass in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PassId(uuid::Uuid);

impl PassId {
    /// Fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Already matched the declaration
    Converged,
    /// Mutations were issued
    Changed,
    /// Dry run: steps were planned but not issued
    Planned,
    /// State could not be determined; nothing was mutated after that point
    Unknown {
        /// What was ambiguous
        reason: String,
    },
    /// Not attempted because a prerequisite did not converge
    Skipped {
        /// Which prerequisite
        reason: String,
    },
    /// The pass raised an error
    Failed {
        /// Error text
        error: String,
    },
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::Changed => f.write_str("changed"),
            Self::Planned => f.write_str("planned"),
            Self::Unknown { reason } => write!(f, "unknown ({reason})"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Failed { error } => write!(f, "failed ({error})"),
        }
    }
}

/// Result of reconciling one resource
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    /// Pass id, also recorded on every log line of the pass
    pub pass_id: PassId,
    /// Resource kind
    pub kind: ResourceKind,
    /// Resource identity
    pub resource: String,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// State observed first
    pub before: ResourceState,
    /// State at the end of the pass, as far as the pass knows
    pub after: ResourceState,
    /// How the pass ended
    pub outcome: PassOutcome,
    /// Mutating commands issued, in order
    pub commands: Vec<AdminCommand>,
    /// Steps planned but not issued (dry run)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PlannedStep>,
    /// Error messages wsadmin printed in response to mutations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PassReport {
    /// Empty report for a pass that is about to start
    #[must_use]
    pub fn begin(pass_id: PassId, kind: ResourceKind, resource: impl Into<String>) -> Self {
        Self {
            pass_id,
            kind,
            resource: resource.into(),
            started_at: Utc::now(),
            before: ResourceState::Unknown,
            after: ResourceState::Unknown,
            outcome: PassOutcome::Converged,
            commands: Vec::new(),
            planned: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Report for a resource that was never attempted
    #[must_use]
    pub fn skipped(kind: ResourceKind, resource: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut report = Self::begin(PassId::new(), kind, resource);
        report.outcome = PassOutcome::Skipped {
            reason: reason.into(),
        };
        report
    }

    /// Report for a pass that raised an error
    #[must_use]
    pub fn failed(kind: ResourceKind, resource: impl Into<String>, error: impl fmt::Display) -> Self {
        let mut report = Self::begin(PassId::new(), kind, resource);
        report.outcome = PassOutcome::Failed {
            error: error.to_string(),
        };
        report
    }

    /// Number of mutating commands issued
    #[inline]
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.commands.len()
    }

    /// Whether the resource still needs another pass
    #[must_use]
    pub fn needs_rerun(&self) -> bool {
        matches!(self.outcome, PassOutcome::Unknown { .. } | PassOutcome::Skipped { .. })
    }

    /// Whether the pass raised an error
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, PassOutcome::Failed { .. })
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}: {} [{} -> {}]",
            self.kind, self.resource, self.outcome, self.before, self.after
        )?;
        for command in &self.commands {
            writeln!(f, "    {command}")?;
        }
        for step in &self.planned {
            writeln!(f, "  + {}", step.command)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  ! {warning}")?;
        }
        Ok(())
    }
}

/// Reports for every resource of one catalog run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// In the order resources were reconciled
    pub reports: Vec<PassReport>,
}

impl RunSummary {
    /// Total mutating commands issued
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.reports.iter().map(PassReport::mutation_count).sum()
    }

    /// `1` if any pass failed, `2` if any resource needs another pass, else `0`
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.reports.iter().any(PassReport::is_failure) {
            1
        } else if self.reports.iter().any(PassReport::needs_rerun) {
            2
        } else {
            0
        }
    }

    /// Report for `resource`, if it was part of the run
    #[must_use]
    pub fn report(&self, resource: &str) -> Option<&PassReport> {
        self.reports.iter().find(|r| r.resource == resource)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            write!(f, "{report}")?;
        }
        write!(
            f,
            "{} resources, {} commands issued",
            self.reports.len(),
            self.mutation_count()
        )
    }
}
