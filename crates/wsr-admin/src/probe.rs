//! State Prober
//!
//! Issues lookup and read commands and turns their text into typed facts.
//! The exit status of wsadmin is never consulted. Output that cannot be
//! parsed confidently becomes [`Observation::Unknown`], which callers must
//! keep apart from "does not exist".

use crate::command::{self, AdminCommand};
use crate::config_id::ConfigId;
use crate::error::{AmbiguousStateError, RunnerError};
use crate::response::AdminResponse;
use crate::runner::AdminSessionRunner;
use std::collections::BTreeMap;
use wsr_schema::{ClusterMemberResource, Identifier, MemberIdentity, PropertyPath};

/// A probed fact, or the admission that the output did not say
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// Parsed with confidence
    Known(T),
    /// Output was not recognizable; state is unknown for this pass
    Unknown(AmbiguousStateError),
}

impl<T> Observation<T> {
    /// Whether this observation is unknown
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// The known value, if any
    #[must_use]
    pub fn known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown(_) => None,
        }
    }

    /// Map the known value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observation<U> {
        match self {
            Self::Known(v) => Observation::Known(f(v)),
            Self::Unknown(e) => Observation::Unknown(e),
        }
    }
}

fn remote_error(response: &AdminResponse) -> Option<AmbiguousStateError> {
    response.error().map(|m| AmbiguousStateError::RemoteError {
        code: m.code.clone(),
        message: m.line.clone(),
    })
}

/// Decide existence from lookup output.
///
/// Empty output means absent. Output containing `name` anywhere means
/// present, which also matches unrelated objects whose names contain
/// `name`. Anything else, including wsadmin error messages, is unknown.
#[must_use]
pub fn parse_existence(raw: &str, name: &str) -> Observation<bool> {
    let response = AdminResponse::parse(raw);
    if let Some(err) = remote_error(&response) {
        return Observation::Unknown(err);
    }
    let body = response.body();
    if body.is_empty() {
        Observation::Known(false)
    } else if body.contains(name) {
        Observation::Known(true)
    } else {
        Observation::Unknown(AmbiguousStateError::UnexpectedOutput {
            query: format!("existence of {name}"),
            output: body,
        })
    }
}

/// Decide a property value from `showAttribute` output.
///
/// Empty output means the attribute is unset or the path did not resolve.
/// A single line is the value. Several lines or an error message is unknown.
#[must_use]
pub fn parse_property(raw: &str, query: &str) -> Observation<Option<String>> {
    let response = AdminResponse::parse(raw);
    if let Some(err) = remote_error(&response) {
        return Observation::Unknown(err);
    }
    match response.body_lines() {
        [] => Observation::Known(None),
        [line] => Observation::Known(Some(line.trim().to_string())),
        _ => Observation::Unknown(AmbiguousStateError::UnexpectedOutput {
            query: query.to_string(),
            output: response.body(),
        }),
    }
}

/// Where a found member lives, as far as the lookup output says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLocation {
    /// Parsed server config id, when the output had the usual shape
    pub config_id: Option<ConfigId>,
}

/// Probed state of an existing member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMember {
    /// Server config id from the lookup
    pub config_id: Option<ConfigId>,
    /// `Server.clusterName`; `None` when the server is in no cluster
    pub cluster: Option<String>,
    /// Current remote value per probed property; `None` means unset
    pub properties: BTreeMap<&'static str, Option<String>>,
}

impl ObservedMember {
    /// Observed value of an identity key, where the remote side reveals it.
    ///
    /// A server in no cluster reports an empty cluster name.
    #[must_use]
    pub fn identity_key(&self, key: &str) -> Option<&str> {
        match key {
            "cluster" => Some(self.cluster.as_deref().unwrap_or("")),
            "cell" => self.config_id.as_ref()?.cell(),
            "node_name" => self.config_id.as_ref()?.node(),
            "server" => self.config_id.as_ref()?.server(),
            _ => None,
        }
    }

    /// Current value of a probed property
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_deref())
    }
}

/// Issues probe commands through one administrative session
pub struct StateProber<'r, R: AdminSessionRunner + ?Sized> {
    runner: &'r R,
    user: &'r str,
}

impl<'r, R: AdminSessionRunner + ?Sized> StateProber<'r, R> {
    /// Probe through `runner`, executing as `user`
    pub fn new(runner: &'r R, user: &'r str) -> Self {
        Self { runner, user }
    }

    fn run(&self, command: &AdminCommand) -> Result<String, RunnerError> {
        tracing::debug!(verb = ?command.verb(), command = %command, user = self.user, "probe");
        let raw = self.runner.execute(&command.script(), self.user)?;
        tracing::trace!(output = %raw, "probe output");
        Ok(raw)
    }

    /// Whether a cluster called `name` exists
    ///
    /// # Errors
    /// `RunnerError` if the lookup could not be run.
    pub fn cluster_exists(&self, name: &Identifier) -> Result<Observation<bool>, RunnerError> {
        let raw = self.run(&command::cluster_lookup(name))?;
        Ok(parse_existence(&raw, name.as_str()))
    }

    /// Find the member's server on its node
    ///
    /// # Errors
    /// `RunnerError` if the lookup could not be run.
    pub fn locate_member(
        &self,
        identity: &MemberIdentity,
    ) -> Result<Observation<Option<MemberLocation>>, RunnerError> {
        let raw = self.run(&command::member_lookup(identity))?;
        Ok(match parse_existence(&raw, identity.server.as_str()) {
            Observation::Known(true) => {
                let body = AdminResponse::parse(&raw).body();
                Observation::Known(Some(MemberLocation {
                    config_id: ConfigId::parse(&body),
                }))
            }
            Observation::Known(false) => Observation::Known(None),
            Observation::Unknown(e) => Observation::Unknown(e),
        })
    }

    /// Whether the member's server exists on its node
    ///
    /// # Errors
    /// `RunnerError` if the lookup could not be run.
    pub fn member_exists(&self, identity: &MemberIdentity) -> Result<Observation<bool>, RunnerError> {
        Ok(self.locate_member(identity)?.map(|found| found.is_some()))
    }

    /// Read one property of the member
    ///
    /// # Errors
    /// `RunnerError` if the read could not be run.
    pub fn read_property(
        &self,
        identity: &MemberIdentity,
        path: &PropertyPath,
    ) -> Result<Observation<Option<String>>, RunnerError> {
        let raw = self.run(&command::read_property(identity, path))?;
        Ok(parse_property(&raw, &format!("{path} of {identity}")))
    }

    /// Probe a member from scratch.
    ///
    /// Returns `Known(None)` when the server does not exist. With
    /// `read_properties`, every remote property of `desired` selected by
    /// `include_defaulted` is read; the first unknown read makes the whole
    /// observation unknown.
    ///
    /// # Errors
    /// `RunnerError` if any probe command could not be run.
    pub fn observe_member(
        &self,
        desired: &ClusterMemberResource,
        read_properties: bool,
        include_defaulted: bool,
    ) -> Result<Observation<Option<ObservedMember>>, RunnerError> {
        let identity = &desired.identity;
        let location = match self.locate_member(identity)? {
            Observation::Known(Some(location)) => location,
            Observation::Known(None) => return Ok(Observation::Known(None)),
            Observation::Unknown(e) => return Ok(Observation::Unknown(e)),
        };

        let cluster = match self.read_property(identity, &PropertyPath::server("clusterName"))? {
            Observation::Known(v) => v,
            Observation::Unknown(e) => return Ok(Observation::Unknown(e)),
        };

        let mut properties = BTreeMap::new();
        if read_properties {
            for property in desired.remote_properties(include_defaulted) {
                let Some(path) = property.descriptor.remote_path() else {
                    continue;
                };
                match self.read_property(identity, &path)? {
                    Observation::Known(v) => {
                        properties.insert(property.name(), v);
                    }
                    Observation::Unknown(e) => return Ok(Observation::Unknown(e)),
                }
            }
        }

        Ok(Observation::Known(Some(ObservedMember {
            config_id: location.config_id,
            cluster,
            properties,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockAdminSessionRunner;
    use mockall::predicate::{always, eq};

    const FOUND: &str =
        "test_cluster(cells/dmgrCell01/clusters/test_cluster|cluster.xml#ServerCluster_1421550161639)";

    #[test]
    fn existence_found() {
        assert_eq!(parse_existence(FOUND, "test_cluster"), Observation::Known(true));
    }

    #[test]
    fn existence_empty_is_absent() {
        assert_eq!(parse_existence("", "test_cluster"), Observation::Known(false));
        assert_eq!(parse_existence("\n  \n", "test_cluster"), Observation::Known(false));
    }

    #[test]
    fn existence_substring_match_is_preserved() {
        let other = "test_cluster_2(cells/dmgrCell01/clusters/test_cluster_2|cluster.xml#ServerCluster_2)";
        assert_eq!(parse_existence(other, "test_cluster"), Observation::Known(true));
    }

    #[test]
    fn existence_unrelated_output_is_unknown() {
        let obs = parse_existence("something else entirely", "test_cluster");
        assert!(matches!(
            obs,
            Observation::Unknown(AmbiguousStateError::UnexpectedOutput { .. })
        ));
    }

    #[test]
    fn existence_error_mentioning_name_is_unknown() {
        let raw = "WASX7015E: Exception running command: test_cluster";
        assert!(matches!(
            parse_existence(raw, "test_cluster"),
            Observation::Unknown(AmbiguousStateError::RemoteError { .. })
        ));
    }

    #[test]
    fn property_shapes() {
        assert_eq!(parse_property("", "q"), Observation::Known(None));
        assert_eq!(parse_property("2048\n", "q"), Observation::Known(Some("2048".into())));
        assert!(parse_property("a\nb", "q").is_unknown());
    }

    #[test]
    fn cluster_exists_uses_lookup_command() {
        let mut runner = MockAdminSessionRunner::new();
        runner
            .expect_execute()
            .with(eq("AdminConfig.getid('/ServerCluster:test_cluster/')"), eq("wasadmin"))
            .times(1)
            .returning(|_, _| Ok(FOUND.to_string()));

        let prober = StateProber::new(&runner, "wasadmin");
        let name = Identifier::parse("name", "test_cluster").unwrap();
        assert_eq!(prober.cluster_exists(&name).unwrap(), Observation::Known(true));
    }

    #[test]
    fn transport_failure_propagates() {
        let mut runner = MockAdminSessionRunner::new();
        runner
            .expect_execute()
            .with(always(), always())
            .returning(|_, _| {
                Err(RunnerError::SessionUnavailable {
                    marker: "WASX7023E".into(),
                })
            });

        let prober = StateProber::new(&runner, "root");
        let name = Identifier::parse("name", "c").unwrap();
        assert!(matches!(
            prober.cluster_exists(&name),
            Err(RunnerError::SessionUnavailable { .. })
        ));
    }
}
