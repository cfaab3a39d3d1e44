//! WSR Schema
//!
//! Data-driven attribute schema for WebSphere clusters and cluster members.
//!
//! # Overview
//!
//! - **AttributeDescriptor**: one row per manageable attribute (kind, default,
//!   normalizer, validator, remote location)
//! - **resolve**: a single routine that validates any declaration against any table
//! - **ClusterResource / ClusterMemberResource**: typed, fully-resolved declarations
//!
//! # Example
//!
//! ```rust
//! use wsr_schema::{ClusterResource, Declaration, RawValue};
//!
//! let mut decl = Declaration::new();
//! decl.insert("name".to_string(), RawValue::from("test_cluster"));
//!
//! let cluster = ClusterResource::from_declaration(&decl).unwrap();
//! assert_eq!(cluster.name.as_str(), "test_cluster");
//! assert_eq!(cluster.user(), "root");
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod resolve;
pub mod resource;
pub mod tables;
pub mod value;

// Re-exports
pub use descriptor::{
    AttributeDescriptor, AttributeKind, ConfigScope, Normalizer, PropertyPath, PropertyTarget,
    ResourceKind, Validator,
};
pub use error::{InvalidAttributeError, SchemaError};
pub use resolve::{resolve, Declaration, ResolvedAttributes, ResolvedValue, ValueSource};
pub use resource::{
    ClusterMemberResource, ClusterResource, Dependency, DesiredProperty, Ensure, MemberIdentity,
    SessionContext,
};
pub use tables::{CLUSTER_ATTRIBUTES, MEMBER_ATTRIBUTES};
pub use value::{is_identifier, Identifier, RawValue, ScriptValue, Secret};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with declarations
    pub use crate::{
        ClusterMemberResource, ClusterResource, Declaration, Ensure, Identifier, MemberIdentity,
        RawValue, SchemaError, SessionContext,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
