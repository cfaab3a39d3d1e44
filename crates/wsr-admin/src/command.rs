//! Command Builder
//!
//! Renders wsadmin scripting expressions from structured parameters. Each
//! function produces exactly one command for one administrative verb.
//!
//! Only [`Identifier`] and [`ScriptValue`] are ever interpolated; both were
//! validated by the schema, so nothing here escapes at runtime.

use serde::Serialize;
use std::fmt;
use wsr_schema::{ConfigScope, Identifier, MemberIdentity, PropertyPath, ScriptValue};

/// Statement appended to mutating commands so the change is persisted in the
/// same wsadmin invocation
pub const SAVE_STATEMENT: &str = "AdminConfig.save()";

/// Administrative verbs this crate issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    /// `AdminConfig.getid` existence lookup
    Lookup,
    /// `AdminConfig.showAttribute`
    ShowAttribute,
    /// `AdminTask.createCluster`
    CreateCluster,
    /// `AdminTask.deleteCluster`
    DeleteCluster,
    /// `AdminTask.createClusterMember`
    CreateClusterMember,
    /// `AdminTask.deleteClusterMember`
    DeleteClusterMember,
    /// `AdminConfig.modify`
    SetProperty,
}

impl Verb {
    /// Whether the verb changes remote configuration
    #[inline]
    #[must_use]
    pub fn mutates(self) -> bool {
        !matches!(self, Self::Lookup | Self::ShowAttribute)
    }
}

/// One rendered administrative command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCommand {
    verb: Verb,
    expression: String,
}

impl AdminCommand {
    fn new(verb: Verb, expression: String) -> Self {
        Self { verb, expression }
    }

    /// The verb this command performs
    #[inline]
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The single-line scripting expression
    #[inline]
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether running this command changes remote configuration
    #[inline]
    #[must_use]
    pub fn mutates(&self) -> bool {
        self.verb.mutates()
    }

    /// Text handed to the runner: the expression, followed by a save for
    /// mutating verbs
    #[must_use]
    pub fn script(&self) -> String {
        if self.mutates() {
            format!("{}; {SAVE_STATEMENT}", self.expression)
        } else {
            self.expression.clone()
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// `AdminConfig.getid('/ServerCluster:<name>/')`
#[must_use]
pub fn cluster_lookup(name: &Identifier) -> AdminCommand {
    AdminCommand::new(Verb::Lookup, format!("AdminConfig.getid('/ServerCluster:{name}/')"))
}

/// `AdminTask.createCluster('[-clusterConfig [-clusterName <name>]]')`
#[must_use]
pub fn create_cluster(name: &Identifier) -> AdminCommand {
    AdminCommand::new(
        Verb::CreateCluster,
        format!("AdminTask.createCluster('[-clusterConfig [-clusterName {name}]]')"),
    )
}

/// `AdminTask.deleteCluster('[-clusterName <name>]')`
#[must_use]
pub fn delete_cluster(name: &Identifier) -> AdminCommand {
    AdminCommand::new(
        Verb::DeleteCluster,
        format!("AdminTask.deleteCluster('[-clusterName {name}]')"),
    )
}

fn server_containment(identity: &MemberIdentity) -> String {
    format!(
        "/Cell:{}/Node:{}/Server:{}/",
        identity.cell, identity.node_name, identity.server
    )
}

fn server_expr(identity: &MemberIdentity) -> String {
    format!("AdminConfig.getid('{}')", server_containment(identity))
}

/// `AdminConfig.getid('/Cell:<cell>/Node:<node>/Server:<server>/')`
#[must_use]
pub fn member_lookup(identity: &MemberIdentity) -> AdminCommand {
    AdminCommand::new(Verb::Lookup, server_expr(identity))
}

/// `AdminTask.createClusterMember(...)` with the member's node and name plus
/// any creation options, in the order given
#[must_use]
pub fn create_member(identity: &MemberIdentity, options: &[(&str, &ScriptValue)]) -> AdminCommand {
    let mut member_config = format!(
        "-memberNode {} -memberName {}",
        identity.node_name, identity.server
    );
    for (option, value) in options {
        member_config.push_str(&format!(" -{option} {value}"));
    }
    AdminCommand::new(
        Verb::CreateClusterMember,
        format!(
            "AdminTask.createClusterMember('[-clusterName {} -memberConfig [{member_config}]]')",
            identity.cluster
        ),
    )
}

/// `AdminTask.deleteClusterMember('[-clusterName <c> -memberNode <n> -memberName <s>]')`
#[must_use]
pub fn delete_member(identity: &MemberIdentity) -> AdminCommand {
    AdminCommand::new(
        Verb::DeleteClusterMember,
        format!(
            "AdminTask.deleteClusterMember('[-clusterName {} -memberNode {} -memberName {}]')",
            identity.cluster, identity.node_name, identity.server
        ),
    )
}

/// Expression that evaluates to the configuration object owning `path`
fn target_expr(identity: &MemberIdentity, scope: ConfigScope) -> String {
    match scope {
        ConfigScope::Server => server_expr(identity),
        ConfigScope::ServerChild(kind) => {
            format!("AdminConfig.list('{kind}', {})", server_expr(identity))
        }
        ConfigScope::ServerNamed { kind, name } => format!(
            "AdminConfig.getid('{}{kind}:{name}/')",
            server_containment(identity)
        ),
        ConfigScope::ClusterMember => format!(
            "AdminConfig.getid('/ServerCluster:{}/ClusterMember:{}/')",
            identity.cluster, identity.server
        ),
    }
}

/// `AdminConfig.showAttribute(<target>, '<attribute>')`
#[must_use]
pub fn read_property(identity: &MemberIdentity, path: &PropertyPath) -> AdminCommand {
    AdminCommand::new(
        Verb::ShowAttribute,
        format!(
            "AdminConfig.showAttribute({}, '{}')",
            target_expr(identity, path.scope),
            path.attribute
        ),
    )
}

/// `AdminConfig.modify(<target>, '[[<attribute> "<value>"]]')`
#[must_use]
pub fn set_property(identity: &MemberIdentity, path: &PropertyPath, value: &ScriptValue) -> AdminCommand {
    AdminCommand::new(
        Verb::SetProperty,
        format!(
            "AdminConfig.modify({}, '[[{} \"{value}\"]]')",
            target_expr(identity, path.scope),
            path.attribute
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(value: &str) -> Identifier {
        Identifier::parse("test", value).unwrap()
    }

    fn identity() -> MemberIdentity {
        MemberIdentity {
            server: id("appServer01"),
            node_name: id("appNode01"),
            cell: id("dmgrCell01"),
            cluster: id("test_cluster"),
            dmgr_profile: id("PROFILE_DMGR_01"),
        }
    }

    #[test]
    fn create_cluster_names_only_the_target() {
        let cmd = create_cluster(&id("foo"));
        assert!(cmd.expression().contains("createCluster"));
        assert!(cmd.expression().contains("-clusterName foo"));
        assert_eq!(cmd.expression().matches("-clusterName").count(), 1);
        assert_eq!(cmd.verb(), Verb::CreateCluster);
    }

    #[test]
    fn mutating_commands_carry_a_save() {
        assert_eq!(
            delete_cluster(&id("foo")).script(),
            "AdminTask.deleteCluster('[-clusterName foo]'); AdminConfig.save()"
        );
        assert_eq!(
            cluster_lookup(&id("foo")).script(),
            "AdminConfig.getid('/ServerCluster:foo/')"
        );
    }

    #[test]
    fn create_member_renders_options_in_order() {
        let weight = ScriptValue::parse("weight", "2").unwrap();
        let ports = ScriptValue::parse("gen_unique_ports", "true").unwrap();
        let cmd = create_member(&identity(), &[("memberWeight", &weight), ("genUniquePorts", &ports)]);
        assert_eq!(
            cmd.expression(),
            "AdminTask.createClusterMember('[-clusterName test_cluster -memberConfig \
             [-memberNode appNode01 -memberName appServer01 -memberWeight 2 -genUniquePorts true]]')"
        );
    }

    #[test]
    fn read_property_targets() {
        let jvm = read_property(&identity(), &PropertyPath::jvm("maximumHeapSize"));
        assert_eq!(
            jvm.expression(),
            "AdminConfig.showAttribute(AdminConfig.list('JavaVirtualMachine', \
             AdminConfig.getid('/Cell:dmgrCell01/Node:appNode01/Server:appServer01/')), 'maximumHeapSize')"
        );

        let pool = read_property(
            &identity(),
            &PropertyPath::named("ThreadPool", "WebContainer", "minimumSize"),
        );
        assert!(pool
            .expression()
            .contains("'/Cell:dmgrCell01/Node:appNode01/Server:appServer01/ThreadPool:WebContainer/'"));

        let weight = read_property(&identity(), &PropertyPath::cluster_member("weight"));
        assert!(weight
            .expression()
            .contains("AdminConfig.getid('/ServerCluster:test_cluster/ClusterMember:appServer01/')"));
    }

    #[test]
    fn set_property_quotes_value() {
        let value = ScriptValue::parse("jvm_generic_jvm_arguments", "-Xgcpolicy:gencon -Dx=1").unwrap();
        let cmd = set_property(&identity(), &PropertyPath::jvm("genericJvmArguments"), &value);
        assert!(cmd
            .expression()
            .ends_with(", '[[genericJvmArguments \"-Xgcpolicy:gencon -Dx=1\"]]')"));
        assert!(cmd.mutates());
    }
}
