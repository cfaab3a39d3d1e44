//! Attribute descriptors
//!
//! Every manageable attribute is one row in a static table (see
//! [`crate::tables`]). A row says what the attribute is, how to default,
//! normalize and validate it, and where it lives on the remote side.
//! Reconciliation logic only ever reads these rows.

use crate::error::InvalidAttributeError;
use crate::value::{canonical_flag, Identifier, RawValue, ScriptValue};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// The two resource kinds this schema covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `websphere_cluster`
    Cluster,
    /// `websphere_cluster_member`
    ClusterMember,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => f.write_str("cluster"),
            Self::ClusterMember => f.write_str("cluster member"),
        }
    }
}

/// Configuration object an attribute is read from and written to,
/// relative to the member's server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    /// The `Server` object itself
    Server,
    /// The single child of the given type, found with `AdminConfig.list`
    ServerChild(&'static str),
    /// A named child addressed by containment path, e.g. `ThreadPool:WebContainer`
    ServerNamed {
        /// Configuration type
        kind: &'static str,
        /// Object name
        name: &'static str,
    },
    /// The `ClusterMember` object under the member's `ServerCluster`
    ClusterMember,
}

/// Remote location of a property: configuration object plus attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    /// Owning configuration object
    pub scope: ConfigScope,
    /// Attribute name on that object
    pub attribute: &'static str,
}

impl PropertyPath {
    /// Attribute on the server object
    #[must_use]
    pub const fn server(attribute: &'static str) -> Self {
        Self {
            scope: ConfigScope::Server,
            attribute,
        }
    }

    /// Attribute on the server's `JavaVirtualMachine`
    #[must_use]
    pub const fn jvm(attribute: &'static str) -> Self {
        Self::child("JavaVirtualMachine", attribute)
    }

    /// Attribute on a single typed child of the server
    #[must_use]
    pub const fn child(kind: &'static str, attribute: &'static str) -> Self {
        Self {
            scope: ConfigScope::ServerChild(kind),
            attribute,
        }
    }

    /// Attribute on a named child of the server
    #[must_use]
    pub const fn named(kind: &'static str, name: &'static str, attribute: &'static str) -> Self {
        Self {
            scope: ConfigScope::ServerNamed { kind, name },
            attribute,
        }
    }

    /// Attribute on the cluster-member object
    #[must_use]
    pub const fn cluster_member(attribute: &'static str) -> Self {
        Self {
            scope: ConfigScope::ClusterMember,
            attribute,
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            ConfigScope::Server => write!(f, "Server.{}", self.attribute),
            ConfigScope::ServerChild(kind) => write!(f, "{kind}.{}", self.attribute),
            ConfigScope::ServerNamed { kind, name } => {
                write!(f, "{kind}:{name}.{}", self.attribute)
            }
            ConfigScope::ClusterMember => write!(f, "ClusterMember.{}", self.attribute),
        }
    }
}

/// Where a mutable property takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyTarget {
    /// Remote location. `None` means the property is never probed or updated in place.
    pub path: Option<PropertyPath>,
    /// Option name passed to the create command, if any
    pub create_option: Option<&'static str>,
}

/// What role an attribute plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Addresses the resource. Immutable for its lifetime, always required.
    IdentityKey,
    /// Converged state
    Property(PropertyTarget),
    /// Configures how commands run, never reconciled
    Parameter,
}

/// Validation rule applied to the normalized value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Accept anything
    Unchecked,
    /// `^[-0-9A-Za-z._]+$`
    Identifier,
    /// Absolute filesystem path
    AbsolutePath,
    /// One of a fixed set of spellings
    OneOf(&'static [&'static str]),
    /// Non-empty run of ASCII digits
    Digits,
    /// Safe inside a double-quoted admin script literal
    ScriptSafe,
}

impl Validator {
    /// Apply the rule
    ///
    /// # Errors
    /// `InvalidAttributeError` naming `attribute` and `value`.
    pub fn check(self, attribute: &str, value: &str) -> Result<(), InvalidAttributeError> {
        match self {
            Self::Unchecked => Ok(()),
            Self::Identifier => Identifier::parse(attribute, value).map(|_| ()),
            Self::ScriptSafe => ScriptValue::parse(attribute, value).map(|_| ()),
            Self::AbsolutePath => {
                if Path::new(value).is_absolute() {
                    Ok(())
                } else {
                    Err(InvalidAttributeError::new(
                        attribute,
                        value,
                        "must be an absolute path",
                    ))
                }
            }
            Self::Digits => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(InvalidAttributeError::new(
                        attribute,
                        value,
                        "must be a non-negative whole number",
                    ))
                }
            }
            Self::OneOf(allowed) => {
                if allowed.contains(&value) {
                    Ok(())
                } else {
                    Err(InvalidAttributeError::new(
                        attribute,
                        value,
                        format!("must be one of {}", allowed.join(", ")),
                    ))
                }
            }
        }
    }
}

/// How a raw value becomes its string form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// String form as written
    Verbatim,
    /// Booleans become `"true"` / `"false"`
    Flag,
}

impl Normalizer {
    /// Normalize a declared value
    #[must_use]
    pub fn apply(self, raw: &RawValue) -> String {
        match self {
            Self::Verbatim => raw.to_text(),
            Self::Flag => canonical_flag(&raw.to_text()),
        }
    }

    /// Normalize a value read back from the remote side for comparison
    #[must_use]
    pub fn apply_remote(self, remote: &str) -> String {
        match self {
            Self::Verbatim => remote.trim().to_string(),
            Self::Flag => canonical_flag(remote.trim()),
        }
    }
}

/// One row of a schema table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Attribute name as it appears in declarations
    pub name: &'static str,
    /// Identity key, property or parameter
    pub kind: AttributeKind,
    /// Stored default, already in normalized form
    pub default: Option<&'static str>,
    /// Validation rule
    pub validator: Validator,
    /// Normalization rule
    pub normalizer: Normalizer,
    /// Never log the value
    pub sensitive: bool,
    /// Human-readable description
    pub doc: &'static str,
}

impl AttributeDescriptor {
    /// Identity key with identifier validation
    #[must_use]
    pub const fn identity(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::IdentityKey,
            default: None,
            validator: Validator::Identifier,
            normalizer: Normalizer::Verbatim,
            sensitive: false,
            doc,
        }
    }

    /// Free-text property stored at `path`
    #[must_use]
    pub const fn property(name: &'static str, path: PropertyPath, doc: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::Property(PropertyTarget {
                path: Some(path),
                create_option: None,
            }),
            default: None,
            validator: Validator::ScriptSafe,
            normalizer: Normalizer::Verbatim,
            sensitive: false,
            doc,
        }
    }

    /// Property only applied when the resource is created
    #[must_use]
    pub const fn create_option(name: &'static str, option: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::Property(PropertyTarget {
                path: None,
                create_option: Some(option),
            }),
            default: None,
            validator: Validator::ScriptSafe,
            normalizer: Normalizer::Verbatim,
            sensitive: false,
            doc,
        }
    }

    /// Execution parameter, unchecked
    #[must_use]
    pub const fn parameter(name: &'static str, doc: &'static str) -> Self {
        Self {
            name,
            kind: AttributeKind::Parameter,
            default: None,
            validator: Validator::Unchecked,
            normalizer: Normalizer::Verbatim,
            sensitive: false,
            doc,
        }
    }

    /// Set the stored default
    #[must_use]
    pub const fn defaults_to(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Also pass the value to the create command as `option`
    #[must_use]
    pub const fn on_create(self, option: &'static str) -> Self {
        let kind = match self.kind {
            AttributeKind::Property(target) => AttributeKind::Property(PropertyTarget {
                create_option: Some(option),
                ..target
            }),
            other => other,
        };
        Self { kind, ..self }
    }

    /// Coerce booleans to their string form
    #[must_use]
    pub const fn flag(self) -> Self {
        Self {
            normalizer: Normalizer::Flag,
            ..self
        }
    }

    /// Replace the validation rule
    #[must_use]
    pub const fn validated_by(self, validator: Validator) -> Self {
        Self { validator, ..self }
    }

    /// Keep the value out of logs
    #[must_use]
    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    /// Whether the attribute addresses the resource
    #[inline]
    #[must_use]
    pub const fn is_identity_key(&self) -> bool {
        matches!(self.kind, AttributeKind::IdentityKey)
    }

    /// Whether the attribute is converged state
    #[inline]
    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(self.kind, AttributeKind::Property(_))
    }

    /// Remote location, for properties that are probed and updated in place
    #[must_use]
    pub const fn remote_path(&self) -> Option<PropertyPath> {
        match self.kind {
            AttributeKind::Property(target) => target.path,
            _ => None,
        }
    }

    /// Create-command option name, for properties passed at creation
    #[must_use]
    pub const fn create_option_name(&self) -> Option<&'static str> {
        match self.kind {
            AttributeKind::Property(target) => target.create_option,
            _ => None,
        }
    }

    /// Stored default, if any
    #[inline]
    #[must_use]
    pub const fn default_value(&self) -> Option<&'static str> {
        self.default
    }

    /// Normalize a raw declared value
    #[must_use]
    pub fn normalize(&self, raw: &RawValue) -> String {
        self.normalizer.apply(raw)
    }

    /// Validate an already-normalized value
    ///
    /// # Errors
    /// `InvalidAttributeError` when the value breaks this row's rule.
    pub fn validate(&self, value: &str) -> Result<(), InvalidAttributeError> {
        self.validator.check(self.name, value)
    }

    /// Value as it may appear in logs
    #[must_use]
    pub fn display_value<'a>(&self, value: &'a str) -> &'a str {
        if self.sensitive {
            "****"
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAP: AttributeDescriptor = AttributeDescriptor::property(
        "jvm_maximum_heap_size",
        PropertyPath::jvm("maximumHeapSize"),
        "heap",
    )
    .defaults_to("1024");

    #[test]
    fn const_builders_compose() {
        assert_eq!(HEAP.default_value(), Some("1024"));
        assert_eq!(HEAP.remote_path(), Some(PropertyPath::jvm("maximumHeapSize")));
        assert!(HEAP.is_property());
        assert!(!HEAP.is_identity_key());
        assert_eq!(HEAP.create_option_name(), None);
    }

    #[test]
    fn on_create_keeps_remote_path() {
        let weight = AttributeDescriptor::property("weight", PropertyPath::cluster_member("weight"), "")
            .on_create("memberWeight");
        assert_eq!(weight.create_option_name(), Some("memberWeight"));
        assert_eq!(weight.remote_path(), Some(PropertyPath::cluster_member("weight")));
    }

    #[test]
    fn flag_normalizer_stringifies_booleans() {
        let d = AttributeDescriptor::property("x", PropertyPath::jvm("x"), "").flag();
        assert_eq!(d.normalize(&RawValue::Flag(false)), "false");
        assert_eq!(d.normalize(&RawValue::from("True")), "true");
    }

    #[test]
    fn absolute_path_validator() {
        let d = AttributeDescriptor::parameter("profile_base", "")
            .validated_by(Validator::AbsolutePath);
        assert!(d.validate("/opt/IBM/WebSphere/AppServer/profiles").is_ok());
        let err = d.validate("opt/profiles").unwrap_err();
        assert_eq!(err.attribute, "profile_base");
    }

    #[test]
    fn one_of_validator_lists_choices() {
        let err = Validator::OneOf(&["present", "absent"])
            .check("ensure", "running")
            .unwrap_err();
        assert!(err.reason.contains("present, absent"));
    }

    #[test]
    fn digits_validator_rejects_list_delimiters() {
        assert!(Validator::Digits.check("weight", "2").is_ok());
        assert!(Validator::Digits.check("weight", "").is_err());
        assert!(Validator::Digits.check("weight", "-1").is_err());
        let err = Validator::Digits
            .check("weight", "2] -memberNode evilNode [")
            .unwrap_err();
        assert_eq!(err.attribute, "weight");
    }

    #[test]
    fn property_path_display() {
        assert_eq!(PropertyPath::jvm("maximumHeapSize").to_string(), "JavaVirtualMachine.maximumHeapSize");
        assert_eq!(
            PropertyPath::named("ThreadPool", "WebContainer", "minimumSize").to_string(),
            "ThreadPool:WebContainer.minimumSize"
        );
    }

    #[test]
    fn sensitive_values_are_masked() {
        let d = AttributeDescriptor::parameter("wsadmin_pass", "").sensitive();
        assert_eq!(d.display_value("hunter2"), "****");
    }
}
