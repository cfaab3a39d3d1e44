//! Generic schema resolution
//!
//! One routine validates any declaration against any table: unknown names are
//! rejected, values are normalized then validated, and defaults fill in
//! whatever was not declared.

use crate::descriptor::{AttributeDescriptor, ResourceKind};
use crate::error::SchemaError;
use crate::value::RawValue;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// A declaration as written: attribute name to loosely typed value
pub type Declaration = BTreeMap<String, RawValue>;

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Written in the declaration
    Declared,
    /// Filled in from the table default
    Defaulted,
}

/// A normalized, validated attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Normalized string form
    pub value: String,
    /// Declared or defaulted
    pub source: ValueSource,
}

/// Output of [`resolve`]: every attribute with a value, in table order
#[derive(Debug, Clone)]
pub struct ResolvedAttributes {
    kind: ResourceKind,
    table: &'static [AttributeDescriptor],
    values: IndexMap<&'static str, ResolvedValue>,
}

impl ResolvedAttributes {
    /// Resource kind these attributes describe
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Normalized value of `name`, declared or defaulted
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.value.as_str())
    }

    /// Full resolved entry for `name`
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ResolvedValue> {
        self.values.get(name)
    }

    /// Whether `name` was written in the declaration
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.values
            .get(name)
            .is_some_and(|v| v.source == ValueSource::Declared)
    }

    /// Rows of the table these attributes were resolved against
    #[must_use]
    pub fn table(&self) -> &'static [AttributeDescriptor] {
        self.table
    }

    /// Resolved rows with their values, in table order
    pub fn iter(&self) -> impl Iterator<Item = (&'static AttributeDescriptor, &ResolvedValue)> + '_ {
        self.table
            .iter()
            .filter_map(|d| self.values.get(d.name).map(|v| (d, v)))
    }
}

/// Resolve a declaration against a schema table
///
/// # Errors
/// - `SchemaError::UnknownAttribute` for names the table does not have
/// - `SchemaError::InvalidAttribute` for values that fail validation
/// - `SchemaError::MissingAttribute` for undeclared identity keys
pub fn resolve(
    kind: ResourceKind,
    table: &'static [AttributeDescriptor],
    declaration: &Declaration,
) -> Result<ResolvedAttributes, SchemaError> {
    for name in declaration.keys() {
        if !table.iter().any(|d| d.name == name) {
            return Err(SchemaError::UnknownAttribute {
                kind,
                attribute: name.clone(),
            });
        }
    }

    let mut values = IndexMap::with_capacity(table.len());
    for descriptor in table {
        let resolved = match declaration.get(descriptor.name) {
            Some(raw) => {
                let value = descriptor.normalize(raw);
                descriptor.validate(&value)?;
                ResolvedValue {
                    value,
                    source: ValueSource::Declared,
                }
            }
            None => match descriptor.default_value() {
                Some(default) => ResolvedValue {
                    value: default.to_string(),
                    source: ValueSource::Defaulted,
                },
                None if descriptor.is_identity_key() => {
                    return Err(SchemaError::MissingAttribute {
                        kind,
                        attribute: descriptor.name,
                    });
                }
                None => continue,
            },
        };
        tracing::trace!(
            attribute = descriptor.name,
            value = descriptor.display_value(&resolved.value),
            source = ?resolved.source,
            "resolved attribute"
        );
        values.insert(descriptor.name, resolved);
    }

    Ok(ResolvedAttributes {
        kind,
        table,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{CLUSTER_ATTRIBUTES, MEMBER_ATTRIBUTES};

    fn decl(pairs: &[(&str, RawValue)]) -> Declaration {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn cluster_defaults_fill_in() {
        let resolved = resolve(
            ResourceKind::Cluster,
            CLUSTER_ATTRIBUTES,
            &decl(&[("name", "test_cluster".into())]),
        )
        .unwrap();
        assert_eq!(resolved.get("user"), Some("root"));
        assert_eq!(resolved.get("ensure"), Some("present"));
        assert!(!resolved.is_declared("user"));
        assert!(resolved.is_declared("name"));
        assert_eq!(resolved.get("profile_base"), None);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = resolve(
            ResourceKind::Cluster,
            CLUSTER_ATTRIBUTES,
            &decl(&[("name", "c".into()), ("colour", "blue".into())]),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAttribute { ref attribute, .. } if attribute == "colour"));
    }

    #[test]
    fn missing_identity_key_is_rejected() {
        let err = resolve(ResourceKind::Cluster, CLUSTER_ATTRIBUTES, &Declaration::new()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingAttribute { attribute: "name", .. }));
    }

    #[test]
    fn declared_boolean_is_normalized() {
        let resolved = resolve(
            ResourceKind::ClusterMember,
            MEMBER_ATTRIBUTES,
            &decl(&[
                ("server", "s1".into()),
                ("node_name", "n1".into()),
                ("cell", "c1".into()),
                ("cluster", "cl1".into()),
                ("dmgr_profile", "PROFILE_DMGR_01".into()),
                ("jvm_verbose_mode_class", true.into()),
                ("jvm_maximum_heap_size", 2048_i64.into()),
            ]),
        )
        .unwrap();
        assert_eq!(resolved.get("jvm_verbose_mode_class"), Some("true"));
        assert_eq!(resolved.get("jvm_verbose_mode_jni"), Some("false"));
        assert_eq!(resolved.get("jvm_maximum_heap_size"), Some("2048"));
        assert_eq!(resolved.get("jvm_debug_mode"), None);
    }

    #[test]
    fn iteration_follows_table_order() {
        let resolved = resolve(
            ResourceKind::Cluster,
            CLUSTER_ATTRIBUTES,
            &decl(&[("user", "wasadmin".into()), ("name", "c".into())]),
        )
        .unwrap();
        let names: Vec<_> = resolved.iter().map(|(d, _)| d.name).collect();
        assert_eq!(names, ["name", "ensure", "user"]);
    }
}
