//! Resource catalogs
//!
//! A catalog is a YAML document with two lists of attribute maps:
//!
//! ```yaml
//! clusters:
//!   - name: test_cluster
//!     dmgr_profile: PROFILE_DMGR_01
//!     profile_base: /opt/IBM/WebSphere/AppServer/profiles
//! members:
//!   - server: appServer01
//!     node_name: appNode01
//!     cell: dmgrCell01
//!     cluster: test_cluster
//!     dmgr_profile: PROFILE_DMGR_01
//!     profile_base: /opt/IBM/WebSphere/AppServer/profiles
//!     jvm_maximum_heap_size: 2048
//! ```
//!
//! Every entry is validated through the schema when the catalog loads, so
//! nothing invalid reaches a reconciler.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use wsr_schema::{
    ClusterMemberResource, ClusterResource, Declaration, Ensure, Identifier, ResourceKind,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    clusters: Vec<Declaration>,
    #[serde(default)]
    members: Vec<Declaration>,
}

/// Validated resources, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Cluster resources
    pub clusters: Vec<ClusterResource>,
    /// Member resources
    pub members: Vec<ClusterMemberResource>,
}

/// Resources that may be reconciled concurrently
#[derive(Debug)]
pub enum Tier<'a> {
    /// Clusters that should exist
    PresentClusters(Vec<&'a ClusterResource>),
    /// All members, present or absent
    Members(Vec<&'a ClusterMemberResource>),
    /// Clusters that should not exist, once their members are gone
    AbsentClusters(Vec<&'a ClusterResource>),
}

impl Catalog {
    /// Parse and validate YAML text; `origin` is only used in errors
    ///
    /// # Errors
    /// `ConfigError::Yaml` for malformed documents, `ConfigError::Declaration`
    /// for entries failing validation, `ConfigError::Duplicate` for repeated
    /// identities.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: CatalogFile = if text.trim().is_empty() {
            CatalogFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?
        };

        let mut catalog = Self::default();
        let mut seen = HashSet::new();
        for (index, decl) in file.clusters.iter().enumerate() {
            let cluster = ClusterResource::from_declaration(decl).map_err(|source| {
                ConfigError::Declaration {
                    kind: ResourceKind::Cluster,
                    index,
                    source,
                }
            })?;
            if !seen.insert(cluster.name.to_string()) {
                return Err(ConfigError::Duplicate {
                    kind: ResourceKind::Cluster,
                    key: cluster.name.to_string(),
                });
            }
            catalog.clusters.push(cluster);
        }

        let mut seen = HashSet::new();
        for (index, decl) in file.members.iter().enumerate() {
            let member = ClusterMemberResource::from_declaration(decl).map_err(|source| {
                ConfigError::Declaration {
                    kind: ResourceKind::ClusterMember,
                    index,
                    source,
                }
            })?;
            if !seen.insert(member.identity.clone()) {
                return Err(ConfigError::Duplicate {
                    kind: ResourceKind::ClusterMember,
                    key: member.identity.to_string(),
                });
            }
            catalog.members.push(member);
        }

        tracing::debug!(
            clusters = catalog.clusters.len(),
            members = catalog.members.len(),
            "catalog validated"
        );
        Ok(catalog)
    }

    /// Read and validate a catalog file
    ///
    /// # Errors
    /// `ConfigError::Read`, plus everything [`Catalog::from_yaml_str`] returns.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Whether the catalog declares nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.members.is_empty()
    }

    /// Cluster declared under `name`
    #[must_use]
    pub fn cluster(&self, name: &str) -> Option<&ClusterResource> {
        self.clusters.iter().find(|c| c.name.as_str() == name)
    }

    /// Application order: present clusters, then members, then absent clusters
    #[must_use]
    pub fn tiers(&self) -> [Tier<'_>; 3] {
        let (present, absent): (Vec<_>, Vec<_>) =
            self.clusters.iter().partition(|c| c.ensure == Ensure::Present);
        [
            Tier::PresentClusters(present),
            Tier::Members(self.members.iter().collect()),
            Tier::AbsentClusters(absent),
        ]
    }

    /// Clusters members depend on that the catalog does not declare.
    ///
    /// They may already exist remotely; callers usually just warn.
    #[must_use]
    pub fn undeclared_clusters(&self) -> Vec<&Identifier> {
        let mut missing: Vec<&Identifier> = Vec::new();
        for member in &self.members {
            let cluster = &member.identity.cluster;
            if self.cluster(cluster.as_str()).is_none() && !missing.contains(&cluster) {
                missing.push(cluster);
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
clusters:
  - name: test_cluster
    dmgr_profile: PROFILE_DMGR_01
    profile_base: /opt/IBM/WebSphere/AppServer/profiles
  - name: old_cluster
    ensure: absent
    dmgr_profile: PROFILE_DMGR_01
    profile_base: /opt/IBM/WebSphere/AppServer/profiles
members:
  - server: appServer01
    node_name: appNode01
    cell: dmgrCell01
    cluster: test_cluster
    dmgr_profile: PROFILE_DMGR_01
    profile_base: /opt/IBM/WebSphere/AppServer/profiles
    jvm_maximum_heap_size: 2048
    jvm_verbose_mode_class: true
  - server: appServer02
    node_name: appNode02
    cell: dmgrCell01
    cluster: other_cluster
    dmgr_profile: PROFILE_DMGR_01
    profile_base: /opt/IBM/WebSphere/AppServer/profiles
"#;

    #[test]
    fn loads_and_orders_tiers() {
        let catalog = Catalog::from_yaml_str(CATALOG, Path::new("catalog.yaml")).unwrap();
        let [present, members, absent] = catalog.tiers();
        assert!(matches!(present, Tier::PresentClusters(ref c) if c.len() == 1 && c[0].name.as_str() == "test_cluster"));
        assert!(matches!(members, Tier::Members(ref m) if m.len() == 2));
        assert!(matches!(absent, Tier::AbsentClusters(ref c) if c.len() == 1 && c[0].name.as_str() == "old_cluster"));
    }

    #[test]
    fn yaml_scalars_are_normalized() {
        let catalog = Catalog::from_yaml_str(CATALOG, Path::new("catalog.yaml")).unwrap();
        let member = &catalog.members[0];
        assert_eq!(member.property("jvm_maximum_heap_size").unwrap().value.as_str(), "2048");
        assert_eq!(member.property("jvm_verbose_mode_class").unwrap().value.as_str(), "true");
    }

    #[test]
    fn undeclared_cluster_is_listed_once() {
        let catalog = Catalog::from_yaml_str(CATALOG, Path::new("catalog.yaml")).unwrap();
        let missing: Vec<_> = catalog.undeclared_clusters().iter().map(|c| c.as_str()).collect();
        assert_eq!(missing, ["other_cluster"]);
    }

    #[test]
    fn invalid_entry_names_its_position() {
        let text = "members:\n  - server: \"bad'name\"\n    node_name: n\n    cell: c\n    cluster: x\n    dmgr_profile: p\n";
        let err = Catalog::from_yaml_str(text, Path::new("catalog.yaml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Declaration { kind: ResourceKind::ClusterMember, index: 0, .. }
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        let text = "clusters:\n  - name: a\n  - name: a\n";
        assert!(matches!(
            Catalog::from_yaml_str(text, Path::new("c.yaml")),
            Err(ConfigError::Duplicate { .. })
        ));
    }

    #[test]
    fn empty_document_is_an_empty_catalog() {
        assert!(Catalog::from_yaml_str("", Path::new("c.yaml")).unwrap().is_empty());
    }
}
