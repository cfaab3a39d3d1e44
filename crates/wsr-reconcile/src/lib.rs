//! WSR Reconcile
//!
//! Idempotent reconciliation of WebSphere clusters and cluster members.
//!
//! # Overview
//!
//! - **ResourceState**: `Absent`, `PresentConsistent`, `PresentDrifted`, `Unknown`
//! - **plan_cluster / plan_member**: pure planning from a fresh observation
//! - **ClusterReconciler / MemberReconciler**: probe, plan, apply, re-probe
//! - **Catalog / apply_catalog**: tiered application of a YAML catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use wsr_admin::{WsadminConfig, WsadminSessionFactory};
//! use wsr_reconcile::{apply_catalog, Catalog, ReconcilerConfig};
//! use std::path::Path;
//!
//! let catalog = Catalog::load(Path::new("catalog.yaml")).unwrap();
//! let factory = WsadminSessionFactory::new(WsadminConfig::default());
//! let summary = apply_catalog(&catalog, &factory, &ReconcilerConfig::default(), 4).unwrap();
//! println!("{summary}");
//! ```

#![warn(missing_docs)]

pub mod apply;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod error;
pub mod plan;
pub mod reconciler;
pub mod report;
pub mod state;

// Re-exports
pub use apply::apply_catalog;
pub use catalog::{Catalog, Tier};
pub use config::{ReconcilerConfig, ToolConfig, CONFIG_ENV, DEFAULT_CONFIG_FILE};
pub use diff::{in_sync, Drift};
pub use error::{ConfigError, ReconcileError};
pub use plan::{plan_cluster, plan_member, Plan, PlannedStep, StepAction};
pub use reconciler::{ClusterReconciler, MemberReconciler};
pub use report::{PassId, PassOutcome, PassReport, RunSummary};
pub use state::{allowed_transitions, validate_transition, ResourceState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running reconciliation passes
    pub use crate::{
        ClusterReconciler, MemberReconciler, PassOutcome, PassReport, ReconcileError,
        ReconcilerConfig, ResourceState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
