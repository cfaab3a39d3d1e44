//! Testing utilities for WSR workspace
//!
//! Shared runners, an in-memory cell, and declaration fixtures.

#![allow(missing_docs)]

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use wsr_admin::{AdminSessionRunner, RunnerError, SessionFactory, SAVE_STATEMENT};
use wsr_schema::{ClusterMemberResource, ClusterResource, Declaration, RawValue, SessionContext};

pub const BANNER: &str = "WASX7209I: Connected to process \"dmgr\" on node dmgrNode01 using SOAP connector;  The type of process is: DeploymentManager";

pub const CONNECT_FAILURE: &str = "WASX7023E: Error creating \"SOAP\" connection to host \"localhost\"; exception information: com.ibm.websphere.management.exception.ConnectorNotAvailableException";

// ---------------------------------------------------------------------------
// Scripted runner
// ---------------------------------------------------------------------------

/// Returns queued responses in order and records every call.
/// An empty queue answers with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<String, RunnerError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outputs<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let runner = Self::new();
        for output in outputs {
            runner.push_output(output);
        }
        runner
    }

    pub fn push_output(&self, output: impl Into<String>) {
        self.responses.lock().push_back(Ok(output.into()));
    }

    pub fn push_error(&self, error: RunnerError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Commands executed so far
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Users commands were executed as
    pub fn users(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, u)| u.clone()).collect()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.ends_with(SAVE_STATEMENT))
            .collect()
    }
}

impl AdminSessionRunner for ScriptedRunner {
    fn execute(&self, command: &str, user: &str) -> Result<String, RunnerError> {
        self.calls.lock().push((command.to_string(), user.to_string()));
        self.responses.lock().pop_front().unwrap_or_else(|| Ok(String::new()))
    }
}

// ---------------------------------------------------------------------------
// Fake cell
// ---------------------------------------------------------------------------

static CLUSTER_LOOKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^AdminConfig\.getid\('/ServerCluster:([^/]+)/'\)$").unwrap());
static SERVER_LOOKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminConfig\.getid\('/Cell:([^/]+)/Node:([^/]+)/Server:([^/]+)/'\)$").unwrap()
});
static CREATE_CLUSTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminTask\.createCluster\('\[-clusterConfig \[-clusterName (\S+)\]\]'\)$").unwrap()
});
static DELETE_CLUSTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^AdminTask\.deleteCluster\('\[-clusterName (\S+)\]'\)$").unwrap());
static CREATE_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^AdminTask\.createClusterMember\('\[-clusterName (\S+) -memberConfig \[-memberNode (\S+) -memberName (\S+)((?: -\w+ \S+)*)\]\]'\)$",
    )
    .unwrap()
});
static DELETE_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminTask\.deleteClusterMember\('\[-clusterName (\S+) -memberNode (\S+) -memberName (\S+)\]'\)$")
        .unwrap()
});
static SHOW_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^AdminConfig\.showAttribute\((.+), '(\w+)'\)$").unwrap());
static MODIFY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^AdminConfig\.modify\((.+), '\[\[(\w+) "(.*)"\]\]'\)$"#).unwrap());
static OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\w+) (\S+)").unwrap());

static TARGET_SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminConfig\.getid\('/Cell:([^/]+)/Node:([^/]+)/Server:([^/]+)/'\)$").unwrap()
});
static TARGET_CHILD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminConfig\.list\('(\w+)', AdminConfig\.getid\('/Cell:([^/]+)/Node:([^/]+)/Server:([^/]+)/'\)\)$")
        .unwrap()
});
static TARGET_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminConfig\.getid\('/Cell:([^/]+)/Node:([^/]+)/Server:([^/]+)/(\w+):([^/]+)/'\)$").unwrap()
});
static TARGET_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^AdminConfig\.getid\('/ServerCluster:([^/]+)/ClusterMember:([^/]+)/'\)$").unwrap()
});

/// A server in the fake cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeServer {
    pub cluster: Option<String>,
    /// Keyed like `JavaVirtualMachine.maximumHeapSize`
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct CellState {
    clusters: BTreeSet<String>,
    /// Keyed by `(node, server)`
    servers: BTreeMap<(String, String), FakeServer>,
    commands: Vec<(String, String)>,
    banner: bool,
    drop_mutations: bool,
    ambiguous_lookups: bool,
    unavailable: bool,
    next_id: u64,
}

/// Which server a target expression resolved to, and the attribute key prefix
struct Target {
    node: String,
    server: String,
    prefix: String,
}

/// In-memory dmgr that interprets the commands the crate renders.
///
/// Clones share state, so one `FakeCell` can be handed out as the session
/// for every resource and inspected afterwards.
#[derive(Debug, Clone)]
pub struct FakeCell {
    cell: String,
    state: Arc<Mutex<CellState>>,
}

impl Default for FakeCell {
    fn default() -> Self {
        Self::new("dmgrCell01")
    }
}

impl FakeCell {
    pub fn new(cell: &str) -> Self {
        Self {
            cell: cell.to_string(),
            state: Arc::new(Mutex::new(CellState::default())),
        }
    }

    pub fn with_cluster(self, name: &str) -> Self {
        self.state.lock().clusters.insert(name.to_string());
        self
    }

    /// Add a server, optionally already in `cluster`
    pub fn with_server(self, node: &str, server: &str, cluster: Option<&str>) -> Self {
        self.state.lock().servers.insert(
            (node.to_string(), server.to_string()),
            FakeServer {
                cluster: cluster.map(str::to_string),
                attributes: BTreeMap::new(),
            },
        );
        self
    }

    /// Prefix every response with the connection banner
    pub fn with_banner(self) -> Self {
        self.state.lock().banner = true;
        self
    }

    /// Accept mutating commands without applying them
    pub fn drop_mutations(&self, drop: bool) {
        self.state.lock().drop_mutations = drop;
    }

    /// Answer lookups with output that is neither empty nor about the object
    pub fn ambiguous_lookups(&self, ambiguous: bool) {
        self.state.lock().ambiguous_lookups = ambiguous;
    }

    /// Fail every command as if the dmgr were down
    pub fn unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn set_attribute(&self, node: &str, server: &str, key: &str, value: &str) {
        if let Some(s) = self.state.lock().servers.get_mut(&(node.to_string(), server.to_string())) {
            s.attributes.insert(key.to_string(), value.to_string());
        }
    }

    pub fn attribute(&self, node: &str, server: &str, key: &str) -> Option<String> {
        self.server(node, server)?.attributes.get(key).cloned()
    }

    pub fn server(&self, node: &str, server: &str) -> Option<FakeServer> {
        self.state
            .lock()
            .servers
            .get(&(node.to_string(), server.to_string()))
            .cloned()
    }

    pub fn has_cluster(&self, name: &str) -> bool {
        self.state.lock().clusters.contains(name)
    }

    pub fn has_member(&self, cluster: &str, node: &str, server: &str) -> bool {
        self.server(node, server)
            .is_some_and(|s| s.cluster.as_deref() == Some(cluster))
    }

    /// Every command executed, in order
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.iter().map(|(c, _)| c.clone()).collect()
    }

    /// Executed commands that carried a save
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.ends_with(SAVE_STATEMENT))
            .collect()
    }

    pub fn users(&self) -> Vec<String> {
        self.state.lock().commands.iter().map(|(_, u)| u.clone()).collect()
    }

    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    fn resolve_target(&self, state: &CellState, expr: &str) -> Option<Target> {
        if let Some(c) = TARGET_SERVER.captures(expr) {
            (c[1] == *self.cell).then(|| Target {
                node: c[2].to_string(),
                server: c[3].to_string(),
                prefix: "Server".to_string(),
            })
        } else if let Some(c) = TARGET_CHILD.captures(expr) {
            (c[2] == *self.cell).then(|| Target {
                node: c[3].to_string(),
                server: c[4].to_string(),
                prefix: c[1].to_string(),
            })
        } else if let Some(c) = TARGET_NAMED.captures(expr) {
            (c[1] == *self.cell).then(|| Target {
                node: c[2].to_string(),
                server: c[3].to_string(),
                prefix: format!("{}:{}", &c[4], &c[5]),
            })
        } else if let Some(c) = TARGET_MEMBER.captures(expr) {
            let (cluster, name) = (&c[1], &c[2]);
            state
                .servers
                .iter()
                .find(|((_, s), srv)| s == name && srv.cluster.as_deref() == Some(cluster))
                .map(|((node, server), _)| Target {
                    node: node.clone(),
                    server: server.clone(),
                    prefix: "ClusterMember".to_string(),
                })
        } else {
            None
        }
    }

    fn interpret(&self, state: &mut CellState, expression: &str, mutating: bool) -> String {
        let mutations_apply = !(mutating && state.drop_mutations);

        if let Some(c) = CLUSTER_LOOKUP.captures(expression) {
            if state.ambiguous_lookups {
                return "garbled response from dmgr".to_string();
            }
            let name = &c[1];
            if state.clusters.contains(name) {
                state.next_id += 1;
                return format!(
                    "{name}(cells/{}/clusters/{name}|cluster.xml#ServerCluster_{})",
                    self.cell, state.next_id
                );
            }
            return String::new();
        }

        if let Some(c) = SERVER_LOOKUP.captures(expression) {
            if state.ambiguous_lookups {
                return "com.ibm.ws.scripting.ScriptingException: unexpected".to_string();
            }
            let key = (c[2].to_string(), c[3].to_string());
            if c[1] == *self.cell && state.servers.contains_key(&key) {
                state.next_id += 1;
                return format!(
                    "{server}(cells/{cell}/nodes/{node}/servers/{server}|server.xml#Server_{id})",
                    server = key.1,
                    cell = self.cell,
                    node = key.0,
                    id = state.next_id
                );
            }
            return String::new();
        }

        if let Some(c) = CREATE_CLUSTER.captures(expression) {
            let name = c[1].to_string();
            if state.clusters.contains(&name) {
                return format!("WASX7015E: Exception running command: ADMG9226E: Cluster {name} already exists.");
            }
            if mutations_apply {
                state.clusters.insert(name);
            }
            return String::new();
        }

        if let Some(c) = DELETE_CLUSTER.captures(expression) {
            let name = &c[1];
            if !state.clusters.contains(name) {
                return format!("WASX7015E: Exception running command: ADMG9204E: Cluster {name} not found.");
            }
            if mutations_apply {
                state.clusters.remove(name);
                for server in state.servers.values_mut() {
                    if server.cluster.as_deref() == Some(name) {
                        server.cluster = None;
                    }
                }
            }
            return String::new();
        }

        if let Some(c) = CREATE_MEMBER.captures(expression) {
            let (cluster, node, name) = (c[1].to_string(), c[2].to_string(), c[3].to_string());
            if !state.clusters.contains(&cluster) {
                return format!("WASX7015E: Exception running command: ADMG9204E: Cluster {cluster} not found.");
            }
            if mutations_apply {
                let server = state.servers.entry((node, name)).or_default();
                server.cluster = Some(cluster);
                for option in OPTION.captures_iter(&c[4]) {
                    if &option[1] == "memberWeight" {
                        server
                            .attributes
                            .insert("ClusterMember.weight".to_string(), option[2].to_string());
                    }
                }
            }
            return String::new();
        }

        if let Some(c) = DELETE_MEMBER.captures(expression) {
            let key = (c[2].to_string(), c[3].to_string());
            let in_cluster = state
                .servers
                .get(&key)
                .is_some_and(|s| s.cluster.as_deref() == Some(&c[1]));
            if !in_cluster {
                return "WASX7015E: Exception running command: ADMG9240E: Member not found.".to_string();
            }
            if mutations_apply {
                state.servers.remove(&key);
            }
            return String::new();
        }

        if let Some(c) = SHOW_ATTRIBUTE.captures(expression) {
            let Some(target) = self.resolve_target(state, &c[1]) else {
                return "WASX7015E: Exception running command: target not found".to_string();
            };
            let Some(server) = state.servers.get(&(target.node, target.server)) else {
                return "WASX7015E: Exception running command: target not found".to_string();
            };
            let key = format!("{}.{}", target.prefix, &c[2]);
            if key == "Server.clusterName" {
                return server.cluster.clone().unwrap_or_default();
            }
            return server.attributes.get(&key).cloned().unwrap_or_default();
        }

        if let Some(c) = MODIFY.captures(expression) {
            let Some(target) = self.resolve_target(state, &c[1]) else {
                return "WASX7015E: Exception running command: target not found".to_string();
            };
            let key = format!("{}.{}", target.prefix, &c[2]);
            let value = c[3].to_string();
            let Some(server) = state.servers.get_mut(&(target.node, target.server)) else {
                return "WASX7015E: Exception running command: target not found".to_string();
            };
            if mutations_apply {
                server.attributes.insert(key, value);
            }
            return String::new();
        }

        format!("WASX7017E: Exception received while running file: unrecognized command {expression}")
    }
}

impl AdminSessionRunner for FakeCell {
    fn execute(&self, command: &str, user: &str) -> Result<String, RunnerError> {
        let mut state = self.state.lock();
        state.commands.push((command.to_string(), user.to_string()));
        if state.unavailable {
            return Err(RunnerError::SessionUnavailable {
                marker: CONNECT_FAILURE.to_string(),
            });
        }

        let suffix = format!("; {SAVE_STATEMENT}");
        let (expression, mutating) = match command.strip_suffix(&suffix) {
            Some(expr) => (expr, true),
            None => (command, false),
        };
        let body = self.interpret(&mut state, expression, mutating);
        if state.banner {
            Ok(format!("{BANNER}\n{body}"))
        } else {
            Ok(body)
        }
    }
}

impl SessionFactory for FakeCell {
    type Runner = FakeCell;

    fn open(&self, _context: &SessionContext) -> Result<FakeCell, RunnerError> {
        Ok(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const PROFILE_BASE: &str = "/opt/IBM/WebSphere/AppServer/profiles";

pub fn declaration(pairs: &[(&str, &str)]) -> Declaration {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), RawValue::from(*v)))
        .collect()
}

pub fn cluster_declaration(name: &str) -> Declaration {
    declaration(&[
        ("name", name),
        ("dmgr_profile", "PROFILE_DMGR_01"),
        ("profile_base", PROFILE_BASE),
        ("user", "webadmin"),
    ])
}

pub fn member_declaration(cluster: &str, node: &str, server: &str) -> Declaration {
    declaration(&[
        ("server", server),
        ("node_name", node),
        ("cell", "dmgrCell01"),
        ("cluster", cluster),
        ("dmgr_profile", "PROFILE_DMGR_01"),
        ("profile_base", PROFILE_BASE),
        ("user", "webadmin"),
    ])
}

pub fn cluster(name: &str) -> ClusterResource {
    ClusterResource::from_declaration(&cluster_declaration(name)).unwrap()
}

pub fn member(cluster: &str, node: &str, server: &str) -> ClusterMemberResource {
    ClusterMemberResource::from_declaration(&member_declaration(cluster, node, server)).unwrap()
}

/// Member with extra declared attributes
pub fn member_with(cluster: &str, node: &str, server: &str, extra: &[(&str, &str)]) -> ClusterMemberResource {
    let mut decl = member_declaration(cluster, node, server);
    for (k, v) in extra {
        decl.insert((*k).to_string(), RawValue::from(*v));
    }
    ClusterMemberResource::from_declaration(&decl).unwrap()
}
