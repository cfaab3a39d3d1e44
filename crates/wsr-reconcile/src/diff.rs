//! Desired versus observed comparison
//!
//! Values are compared after normalization on both sides. When the remote
//! side has no value at all, the tie goes to "no write" if the desired value
//! is what an unset attribute means anyway: empty, the table default, or
//! `false` for a flag.

use serde::Serialize;
use wsr_admin::ObservedMember;
use wsr_schema::{
    AttributeDescriptor, ClusterMemberResource, MemberIdentity, Normalizer, PropertyPath,
    ScriptValue,
};

/// Whether `observed` already satisfies `desired` for `descriptor`
#[must_use]
pub fn in_sync(descriptor: &AttributeDescriptor, desired: &str, observed: Option<&str>) -> bool {
    let desired = desired.trim();
    match observed.map(str::trim).filter(|v| !v.is_empty()) {
        Some(remote) => descriptor.normalizer.apply_remote(remote) == desired,
        None if desired.is_empty() => true,
        None => {
            descriptor.default_value() == Some(desired)
                || (descriptor.normalizer == Normalizer::Flag && desired == "false")
        }
    }
}

/// One mutable property that needs a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Attribute name
    pub property: &'static str,
    /// Where it is written
    #[serde(skip)]
    pub path: PropertyPath,
    /// Value to write
    pub desired: ScriptValue,
    /// Value found, `None` when unset
    pub observed: Option<String>,
}

/// Properties of `desired` that differ from `observed`.
///
/// Only properties present in `observed.properties` are compared; anything
/// that was not probed cannot drift.
#[must_use]
pub fn member_drift(
    desired: &ClusterMemberResource,
    observed: &ObservedMember,
    include_defaulted: bool,
) -> Vec<Drift> {
    desired
        .remote_properties(include_defaulted)
        .filter_map(|property| {
            let path = property.descriptor.remote_path()?;
            let current = observed.properties.get(property.name())?;
            if in_sync(property.descriptor, property.value.as_str(), current.as_deref()) {
                return None;
            }
            Some(Drift {
                property: property.name(),
                path,
                desired: property.value.clone(),
                observed: current.clone(),
            })
        })
        .collect()
}

/// First identity key whose remote value differs, as `(key, desired, observed)`
#[must_use]
pub fn identity_drift<'a>(
    desired: &'a MemberIdentity,
    observed: &'a ObservedMember,
) -> Option<(&'static str, &'a str, &'a str)> {
    desired.keys().into_iter().find_map(|(key, value)| {
        let remote = observed.identity_key(key)?;
        (remote != value.as_str()).then_some((key, value.as_str(), remote))
    })
}
