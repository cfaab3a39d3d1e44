//! Configuration object identifiers
//!
//! `AdminConfig.getid` answers with strings like
//! `appServer01(cells/dmgrCell01/nodes/appNode01/servers/appServer01|server.xml#Server_1421550161640)`.
//! There is no documented grammar; this parser accepts that shape and
//! nothing else.

use once_cell::sync::Lazy;
use regex::Regex;

static CONFIG_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^()\s]*)\(([^|()]*)\|([^#()]*)#([^()]*)\)$").expect("config id pattern is valid")
});

/// A parsed configuration id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigId {
    /// Display name before the parenthesis (may be empty)
    pub name: String,
    /// Containment path, e.g. `cells/c/nodes/n/servers/s`
    pub path: String,
    /// Backing document, e.g. `server.xml`
    pub document: String,
    /// Object id within the document, e.g. `Server_1421550161640`
    pub object: String,
}

impl ConfigId {
    /// Parse one config id. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = CONFIG_ID.captures(text.trim())?;
        Some(Self {
            name: caps[1].to_string(),
            path: caps[2].to_string(),
            document: caps[3].to_string(),
            object: caps[4].to_string(),
        })
    }

    /// Value following `key` in the containment path, e.g. `segment("nodes")`
    #[must_use]
    pub fn segment(&self, key: &str) -> Option<&str> {
        let mut parts = self.path.split('/');
        while let Some(part) = parts.next() {
            if part == key {
                return parts.next();
            }
        }
        None
    }

    /// Cell the object lives in
    #[must_use]
    pub fn cell(&self) -> Option<&str> {
        self.segment("cells")
    }

    /// Node the object lives on
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        self.segment("nodes")
    }

    /// Server the object belongs to
    #[must_use]
    pub fn server(&self) -> Option<&str> {
        self.segment("servers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cluster_id() {
        let id = ConfigId::parse(
            "test_cluster(cells/dmgrCell01/clusters/test_cluster|cluster.xml#ServerCluster_1421550161639)",
        )
        .unwrap();
        assert_eq!(id.name, "test_cluster");
        assert_eq!(id.cell(), Some("dmgrCell01"));
        assert_eq!(id.segment("clusters"), Some("test_cluster"));
        assert_eq!(id.document, "cluster.xml");
        assert_eq!(id.object, "ServerCluster_1421550161639");
    }

    #[test]
    fn parses_server_id() {
        let id = ConfigId::parse(
            "appServer01(cells/dmgrCell01/nodes/appNode01/servers/appServer01|server.xml#Server_1)\n",
        )
        .unwrap();
        assert_eq!(id.node(), Some("appNode01"));
        assert_eq!(id.server(), Some("appServer01"));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(ConfigId::parse("").is_none());
        assert!(ConfigId::parse("1024").is_none());
        assert!(ConfigId::parse("a(b)").is_none());
        assert!(ConfigId::parse("x(cells/c|f#o)\ny(cells/c|f#o)").is_none());
    }
}
