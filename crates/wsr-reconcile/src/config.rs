//! Tool configuration
//!
//! ```toml
//! [admin]
//! timeout_secs = 600
//!
//! [reconcile]
//! manage_defaults = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use wsr_admin::WsadminConfig;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "WSR_CONFIG";

/// File looked for in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "wsr.toml";

/// Reconciler behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Re-probe after a create before reporting the resource present
    pub verify_after_create: bool,
    /// Reconcile properties left at their defaults, not only declared ones
    pub manage_defaults: bool,
    /// Probe and plan only
    pub dry_run: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            verify_after_create: true,
            manage_defaults: true,
            dry_run: false,
        }
    }
}

impl ReconcilerConfig {
    /// Create a new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set re-probe after create
    #[inline]
    #[must_use]
    pub fn with_verify_after_create(mut self, verify: bool) -> Self {
        self.verify_after_create = verify;
        self
    }

    /// Set whether defaulted properties are reconciled
    #[inline]
    #[must_use]
    pub fn with_manage_defaults(mut self, manage: bool) -> Self {
        self.manage_defaults = manage;
        self
    }

    /// Set dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Contents of `wsr.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// How wsadmin is run
    pub admin: WsadminConfig,
    /// How passes behave
    pub reconcile: ReconcilerConfig,
}

impl ToolConfig {
    /// Parse TOML text; `origin` is only used in errors
    ///
    /// # Errors
    /// `ConfigError::Toml` on malformed input.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from a file that must exist
    ///
    /// # Errors
    /// `ConfigError::Read` or `ConfigError::Toml`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load from `explicit`, else `$WSR_CONFIG`, else `./wsr.toml` if present,
    /// else defaults.
    ///
    /// # Errors
    /// An explicitly named file that is missing or malformed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = config_path(explicit, std::env::var_os(CONFIG_ENV));
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::load(&path)
    }
}

/// Which file to read, and whether it must exist
#[must_use]
pub fn config_path(explicit: Option<&Path>, env: Option<OsString>) -> (PathBuf, bool) {
    match (explicit, env) {
        (Some(path), _) => (path.to_path_buf(), true),
        (None, Some(var)) if !var.is_empty() => (PathBuf::from(var), true),
        _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ToolConfig::from_toml_str("", Path::new("wsr.toml")).unwrap();
        assert_eq!(config, ToolConfig::default());
        assert!(config.reconcile.verify_after_create);
        assert_eq!(config.admin.script, PathBuf::from("bin/wsadmin.sh"));
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let text = "[admin]\ntimeout_secs = 600\nswitch_user = false\n\n[reconcile]\nmanage_defaults = false\n";
        let config = ToolConfig::from_toml_str(text, Path::new("wsr.toml")).unwrap();
        assert_eq!(config.admin.timeout_secs, Some(600));
        assert!(!config.admin.switch_user);
        assert_eq!(config.admin.conntype, "SOAP");
        assert!(!config.reconcile.manage_defaults);
        assert!(config.reconcile.verify_after_create);
    }

    #[test]
    fn unknown_table_is_rejected() {
        let err = ToolConfig::from_toml_str("[nope]\nx = 1\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn path_precedence() {
        assert_eq!(
            config_path(Some(Path::new("/etc/wsr.toml")), Some("/tmp/x.toml".into())),
            (PathBuf::from("/etc/wsr.toml"), true)
        );
        assert_eq!(
            config_path(None, Some("/tmp/x.toml".into())),
            (PathBuf::from("/tmp/x.toml"), true)
        );
        assert_eq!(config_path(None, None), (PathBuf::from(DEFAULT_CONFIG_FILE), false));
    }
}
