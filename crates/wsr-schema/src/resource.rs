//! Typed resource declarations
//!
//! Built from [`ResolvedAttributes`]; by the time one of these exists every
//! value has been defaulted, normalized and validated.

use crate::descriptor::{AttributeDescriptor, ResourceKind};
use crate::error::SchemaError;
use crate::resolve::{resolve, Declaration, ResolvedAttributes, ValueSource};
use crate::tables::{CLUSTER_ATTRIBUTES, MEMBER_ATTRIBUTES};
use crate::value::{Identifier, ScriptValue, Secret};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Desired existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ensure {
    /// Should exist
    Present,
    /// Should not exist
    Absent,
}

impl Ensure {
    fn from_resolved(attrs: &ResolvedAttributes) -> Self {
        match attrs.get("ensure") {
            Some("absent") => Self::Absent,
            _ => Self::Present,
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// How administrative commands for a resource are executed.
///
/// None of this is reconciled state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// OS user wsadmin runs as
    pub user: Identifier,
    /// Absolute profile base directory
    pub profile_base: Option<PathBuf>,
    /// Explicit profile to run wsadmin from
    pub profile: Option<Identifier>,
    /// DMGR profile
    pub dmgr_profile: Option<Identifier>,
    /// DMGR host to connect to
    pub dmgr_host: Option<Identifier>,
    /// wsadmin username
    pub wsadmin_user: Option<String>,
    /// wsadmin password
    pub wsadmin_pass: Option<Secret>,
}

impl SessionContext {
    /// Context running as `user` with no profile information
    #[must_use]
    pub fn for_user(user: Identifier) -> Self {
        Self {
            user,
            profile_base: None,
            profile: None,
            dmgr_profile: None,
            dmgr_host: None,
            wsadmin_user: None,
            wsadmin_pass: None,
        }
    }

    fn from_resolved(attrs: &ResolvedAttributes) -> Result<Self, SchemaError> {
        let user = Identifier::parse("user", attrs.get("user").unwrap_or("root"))?;
        Ok(Self {
            user,
            profile_base: attrs.get("profile_base").map(PathBuf::from),
            profile: optional_identifier(attrs, "profile")?,
            dmgr_profile: optional_identifier(attrs, "dmgr_profile")?,
            dmgr_host: optional_identifier(attrs, "dmgr_host")?,
            wsadmin_user: attrs.get("wsadmin_user").map(str::to_string),
            wsadmin_pass: attrs.get("wsadmin_pass").map(Secret::new),
        })
    }

    /// Profile wsadmin runs from: `profile`, falling back to `dmgr_profile`
    #[must_use]
    pub fn effective_profile(&self) -> Option<&Identifier> {
        self.profile.as_ref().or(self.dmgr_profile.as_ref())
    }

    /// `<profile_base>/<effective profile>`, when both are known
    #[must_use]
    pub fn profile_dir(&self) -> Option<PathBuf> {
        let base: &Path = self.profile_base.as_deref()?;
        Some(base.join(self.effective_profile()?.as_str()))
    }
}

fn optional_identifier(
    attrs: &ResolvedAttributes,
    name: &str,
) -> Result<Option<Identifier>, SchemaError> {
    attrs
        .get(name)
        .map(|v| Identifier::parse(name, v))
        .transpose()
        .map_err(SchemaError::from)
}

fn required_identifier(attrs: &ResolvedAttributes, name: &'static str) -> Result<Identifier, SchemaError> {
    let value = attrs.get(name).ok_or(SchemaError::MissingAttribute {
        kind: attrs.kind(),
        attribute: name,
    })?;
    Ok(Identifier::parse(name, value)?)
}

/// A cluster: exists or not, nothing else
#[derive(Debug, Clone)]
pub struct ClusterResource {
    /// Cluster name, the only identity key
    pub name: Identifier,
    /// Desired existence
    pub ensure: Ensure,
    /// Execution context
    pub session: SessionContext,
}

impl ClusterResource {
    /// Validate a declaration against the cluster table
    ///
    /// # Errors
    /// Any `SchemaError` from resolution.
    pub fn from_declaration(declaration: &Declaration) -> Result<Self, SchemaError> {
        let attrs = resolve(ResourceKind::Cluster, CLUSTER_ATTRIBUTES, declaration)?;
        Self::from_resolved(&attrs)
    }

    /// Build from attributes already resolved against [`CLUSTER_ATTRIBUTES`]
    ///
    /// # Errors
    /// `SchemaError::MissingAttribute` if `name` is absent.
    pub fn from_resolved(attrs: &ResolvedAttributes) -> Result<Self, SchemaError> {
        Ok(Self {
            name: required_identifier(attrs, "name")?,
            ensure: Ensure::from_resolved(attrs),
            session: SessionContext::from_resolved(attrs)?,
        })
    }

    /// OS user administrative commands run as
    #[must_use]
    pub fn user(&self) -> &str {
        self.session.user.as_str()
    }
}

/// The keys that together address one cluster member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberIdentity {
    /// Server name
    pub server: Identifier,
    /// Node the server lives on
    pub node_name: Identifier,
    /// Owning cell
    pub cell: Identifier,
    /// Cluster the server belongs to
    pub cluster: Identifier,
    /// DMGR profile
    pub dmgr_profile: Identifier,
}

impl MemberIdentity {
    /// Identity keys as `(attribute, value)` pairs, in table order
    #[must_use]
    pub fn keys(&self) -> [(&'static str, &Identifier); 5] {
        [
            ("server", &self.server),
            ("node_name", &self.node_name),
            ("cell", &self.cell),
            ("cluster", &self.cluster),
            ("dmgr_profile", &self.dmgr_profile),
        ]
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.cell, self.node_name, self.server, self.cluster
        )
    }
}

/// A desired mutable property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredProperty {
    /// Schema row
    pub descriptor: &'static AttributeDescriptor,
    /// Normalized, script-safe value
    pub value: ScriptValue,
    /// Declared or defaulted
    pub source: ValueSource,
}

impl DesiredProperty {
    /// Attribute name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Something a member needs in place before it can be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// `websphere_cluster` of this name
    Cluster(Identifier),
    /// OS user
    User(Identifier),
    /// OS group
    Group(Identifier),
}

/// One server participating in a cluster
#[derive(Debug, Clone)]
pub struct ClusterMemberResource {
    /// Immutable identity keys
    pub identity: MemberIdentity,
    /// Desired existence
    pub ensure: Ensure,
    /// Execution context
    pub session: SessionContext,
    /// Managed properties with a value (declared or defaulted), in table order
    pub properties: Vec<DesiredProperty>,
}

impl ClusterMemberResource {
    /// Validate a declaration against the member table
    ///
    /// # Errors
    /// Any `SchemaError` from resolution.
    pub fn from_declaration(declaration: &Declaration) -> Result<Self, SchemaError> {
        let attrs = resolve(ResourceKind::ClusterMember, MEMBER_ATTRIBUTES, declaration)?;
        Self::from_resolved(&attrs)
    }

    /// Build from attributes already resolved against [`MEMBER_ATTRIBUTES`]
    ///
    /// # Errors
    /// `SchemaError` if an identity key is missing or a property value is not script-safe.
    pub fn from_resolved(attrs: &ResolvedAttributes) -> Result<Self, SchemaError> {
        let identity = MemberIdentity {
            server: required_identifier(attrs, "server")?,
            node_name: required_identifier(attrs, "node_name")?,
            cell: required_identifier(attrs, "cell")?,
            cluster: required_identifier(attrs, "cluster")?,
            dmgr_profile: required_identifier(attrs, "dmgr_profile")?,
        };

        if attrs.is_declared("replicator_entry") {
            tracing::debug!(member = %identity, "replicator_entry is reserved and has no effect");
        }

        let mut properties = Vec::new();
        for (descriptor, resolved) in attrs.iter() {
            if !descriptor.is_property() {
                continue;
            }
            properties.push(DesiredProperty {
                descriptor,
                value: ScriptValue::parse(descriptor.name, &resolved.value)?,
                source: resolved.source,
            });
        }

        Ok(Self {
            identity,
            ensure: Ensure::from_resolved(attrs),
            session: SessionContext::from_resolved(attrs)?,
            properties,
        })
    }

    /// OS user administrative commands run as
    #[must_use]
    pub fn user(&self) -> &str {
        self.session.user.as_str()
    }

    /// Desired value of one property
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&DesiredProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Properties passed to the create command, as `(option, value)`
    pub fn create_options(&self) -> impl Iterator<Item = (&'static str, &ScriptValue)> + '_ {
        self.properties
            .iter()
            .filter_map(|p| p.descriptor.create_option_name().map(|o| (o, &p.value)))
    }

    /// Properties probed and updated in place.
    ///
    /// With `include_defaulted = false` only declared properties are returned.
    pub fn remote_properties(&self, include_defaulted: bool) -> impl Iterator<Item = &DesiredProperty> + '_ {
        self.properties.iter().filter(move |p| {
            p.descriptor.remote_path().is_some()
                && (include_defaulted || p.source == ValueSource::Declared)
        })
    }

    /// What must exist before this member: its cluster and run-as principals.
    ///
    /// A principal that is not a plain name is written as declared but not
    /// recorded as a dependency.
    #[must_use]
    pub fn requires(&self) -> Vec<Dependency> {
        let principal = |name: &str| {
            self.property(name)
                .and_then(|p| Identifier::parse(name, p.value.as_str()).ok())
        };

        let mut deps = vec![Dependency::Cluster(self.identity.cluster.clone())];
        deps.extend(principal("runas_user").map(Dependency::User));
        deps.extend(principal("runas_group").map(Dependency::Group));
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RawValue;

    fn member_decl() -> Declaration {
        [
            ("server", "appServer01"),
            ("node_name", "appNode01"),
            ("cell", "dmgrCell01"),
            ("cluster", "test_cluster"),
            ("dmgr_profile", "PROFILE_DMGR_01"),
            ("profile_base", "/opt/IBM/WebSphere/AppServer/profiles"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), RawValue::from(v)))
        .collect()
    }

    #[test]
    fn member_profile_defaults_to_dmgr_profile() {
        let member = ClusterMemberResource::from_declaration(&member_decl()).unwrap();
        assert_eq!(
            member.session.profile_dir(),
            Some(PathBuf::from("/opt/IBM/WebSphere/AppServer/profiles/PROFILE_DMGR_01"))
        );
        assert_eq!(member.user(), "root");
        assert_eq!(member.ensure, Ensure::Present);
    }

    #[test]
    fn member_defaults_become_properties() {
        let member = ClusterMemberResource::from_declaration(&member_decl()).unwrap();
        assert_eq!(member.property("umask").unwrap().value.as_str(), "022");
        assert_eq!(member.property("weight").unwrap().source, ValueSource::Defaulted);
        assert!(member.property("jvm_debug_args").is_none());
        let options: Vec<_> = member.create_options().map(|(o, v)| (o, v.as_str())).collect();
        assert_eq!(options, [("memberWeight", "2"), ("genUniquePorts", "true")]);
    }

    #[test]
    fn declared_only_filter() {
        let mut decl = member_decl();
        decl.insert("jvm_maximum_heap_size".into(), RawValue::Integer(2048));
        let member = ClusterMemberResource::from_declaration(&decl).unwrap();
        let declared: Vec<_> = member.remote_properties(false).map(DesiredProperty::name).collect();
        assert_eq!(declared, ["jvm_maximum_heap_size"]);
        assert!(member.remote_properties(true).count() > 1);
        assert!(member.remote_properties(true).all(|p| p.name() != "gen_unique_ports"));
    }

    #[test]
    fn requires_cluster_and_principals() {
        let mut decl = member_decl();
        decl.insert("runas_user".into(), "webadmin".into());
        decl.insert("runas_group".into(), "webadmins".into());
        let member = ClusterMemberResource::from_declaration(&decl).unwrap();
        let deps = member.requires();
        assert_eq!(deps[0], Dependency::Cluster(Identifier::parse("cluster", "test_cluster").unwrap()));
        assert!(matches!(deps[1], Dependency::User(ref u) if u.as_str() == "webadmin"));
        assert!(matches!(deps[2], Dependency::Group(ref g) if g.as_str() == "webadmins"));
    }

    #[test]
    fn principal_outside_identifier_charset_is_not_a_dependency() {
        let mut decl = member_decl();
        decl.insert("runas_user".into(), "was@corp".into());
        let member = ClusterMemberResource::from_declaration(&decl).unwrap();
        assert_eq!(member.requires().len(), 1);
    }

    #[test]
    fn password_is_wrapped() {
        let mut decl = member_decl();
        decl.insert("wsadmin_pass".into(), "s3cret".into());
        let member = ClusterMemberResource::from_declaration(&decl).unwrap();
        assert!(!format!("{:?}", member.session).contains("s3cret"));
    }
}
