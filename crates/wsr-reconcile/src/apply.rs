//! Tiered catalog application
//!
//! Tiers run one after another; resources inside a tier run on a rayon pool,
//! each with a session of its own from the [`SessionFactory`].

use crate::catalog::{Catalog, Tier};
use crate::config::ReconcilerConfig;
use crate::error::ConfigError;
use crate::reconciler::{ClusterReconciler, MemberReconciler};
use crate::report::{PassReport, RunSummary};
use rayon::prelude::*;
use std::collections::HashSet;
use wsr_admin::SessionFactory;
use wsr_schema::{ClusterMemberResource, ClusterResource, Dependency, ResourceKind};

fn reconcile_cluster<F: SessionFactory>(
    factory: &F,
    config: &ReconcilerConfig,
    cluster: &ClusterResource,
) -> PassReport {
    let name = cluster.name.as_str();
    let runner = match factory.open(&cluster.session) {
        Ok(runner) => runner,
        Err(e) => return PassReport::failed(ResourceKind::Cluster, name, e),
    };
    ClusterReconciler::new(&runner, config)
        .reconcile(cluster)
        .unwrap_or_else(|e| PassReport::failed(ResourceKind::Cluster, name, e))
}

fn reconcile_member<F: SessionFactory>(
    factory: &F,
    config: &ReconcilerConfig,
    member: &ClusterMemberResource,
    unsettled: &HashSet<String>,
) -> PassReport {
    let resource = member.identity.to_string();
    for dep in member.requires() {
        if let Dependency::Cluster(cluster) = dep {
            if unsettled.contains(cluster.as_str()) {
                tracing::warn!(member = %resource, %cluster, "skipping member; its cluster did not converge");
                return PassReport::skipped(
                    ResourceKind::ClusterMember,
                    resource,
                    format!("cluster {cluster} did not converge"),
                );
            }
        }
    }

    let runner = match factory.open(&member.session) {
        Ok(runner) => runner,
        Err(e) => return PassReport::failed(ResourceKind::ClusterMember, resource, e),
    };
    MemberReconciler::new(&runner, config)
        .reconcile(member)
        .unwrap_or_else(|e| PassReport::failed(ResourceKind::ClusterMember, resource, e))
}

/// Reconcile every resource of `catalog`, `jobs` at a time within a tier.
///
/// Members whose cluster failed, was skipped or ended unknown in this run
/// are skipped.
///
/// # Errors
/// `ConfigError::ThreadPool` if the worker pool cannot start. Per-resource
/// failures are reported in the summary, not returned.
pub fn apply_catalog<F: SessionFactory>(
    catalog: &Catalog,
    factory: &F,
    config: &ReconcilerConfig,
    jobs: usize,
) -> Result<RunSummary, ConfigError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|i| format!("wsr-worker-{i}"))
        .build()?;

    for name in catalog.undeclared_clusters() {
        tracing::warn!(cluster = %name, "members reference a cluster the catalog does not declare");
    }

    let mut summary = RunSummary::default();
    let mut unsettled: HashSet<String> = HashSet::new();

    for tier in catalog.tiers() {
        let reports: Vec<PassReport> = match tier {
            Tier::PresentClusters(clusters) | Tier::AbsentClusters(clusters) => pool.install(|| {
                clusters
                    .par_iter()
                    .map(|c| reconcile_cluster(factory, config, c))
                    .collect()
            }),
            Tier::Members(members) => pool.install(|| {
                members
                    .par_iter()
                    .map(|m| reconcile_member(factory, config, m, &unsettled))
                    .collect()
            }),
        };

        for report in &reports {
            if report.kind == ResourceKind::Cluster && (report.is_failure() || report.needs_rerun()) {
                unsettled.insert(report.resource.clone());
            }
        }
        summary.reports.extend(reports);
    }

    tracing::info!(
        resources = summary.reports.len(),
        commands = summary.mutation_count(),
        exit_code = summary.exit_code(),
        "run finished"
    );
    Ok(summary)
}
