//! Error types for schema validation
//!
//! Validation failures are reported before any administrative command is
//! built. Nothing here is ever sent to the remote tool.

use crate::descriptor::ResourceKind;

/// A single attribute value was rejected by its validator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {attribute} '{value}': {reason}")]
pub struct InvalidAttributeError {
    /// Attribute name as declared in the schema table
    pub attribute: String,
    /// The offending value, after normalization
    pub value: String,
    /// Why the validator rejected it
    pub reason: String,
}

impl InvalidAttributeError {
    /// Create a new validation error
    #[must_use]
    pub fn new(
        attribute: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors produced while resolving a declaration against a schema table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A declared value failed validation
    #[error(transparent)]
    InvalidAttribute(#[from] InvalidAttributeError),

    /// The declaration names an attribute the schema does not know
    #[error("unknown attribute '{attribute}' for {kind}")]
    UnknownAttribute {
        /// Resource kind being resolved
        kind: ResourceKind,
        /// The unknown attribute name
        attribute: String,
    },

    /// A required attribute (identity key) was not declared
    #[error("missing required attribute '{attribute}' for {kind}")]
    MissingAttribute {
        /// Resource kind being resolved
        kind: ResourceKind,
        /// The missing attribute name
        attribute: &'static str,
    },
}

impl SchemaError {
    /// Name of the attribute this error is about
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::InvalidAttribute(e) => &e.attribute,
            Self::UnknownAttribute { attribute, .. } => attribute,
            Self::MissingAttribute { attribute, .. } => attribute,
        }
    }
}
