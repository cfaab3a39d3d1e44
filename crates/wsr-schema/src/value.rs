//! Attribute values
//!
//! Declarations arrive loosely typed (`RawValue`). Normalization turns every
//! value into its string form; validation then produces the strongly typed
//! values the command builder is allowed to interpolate.

use crate::error::InvalidAttributeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-0-9A-Za-z._]+$").expect("identifier pattern is valid"));

/// A declared attribute value before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// `true` / `false`
    Flag(bool),
    /// Whole numbers, e.g. heap sizes written without quotes
    Integer(i64),
    /// Anything else
    Text(String),
}

impl RawValue {
    /// Coerce to the string representation used for comparison and transmission
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Flag(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Check a value against `^[-0-9A-Za-z._]+$`
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(value)
}

/// Canonical string form of a boolean-like value.
///
/// `True`, `FALSE` and friends collapse to lowercase; anything that is not a
/// boolean spelling passes through untouched.
#[must_use]
pub fn canonical_flag(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        "true".to_string()
    } else if trimmed.eq_ignore_ascii_case("false") {
        "false".to_string()
    } else {
        value.to_string()
    }
}

/// A name that may be interpolated into an admin command unquoted
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `value` as an identifier for `attribute`
    ///
    /// # Errors
    /// `InvalidAttributeError` when `value` contains anything outside `[-0-9A-Za-z._]`.
    pub fn parse(attribute: &str, value: &str) -> Result<Self, InvalidAttributeError> {
        if is_identifier(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidAttributeError::new(
                attribute,
                value,
                "must match ^[-0-9A-Za-z._]+$",
            ))
        }
    }

    /// Borrow the identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A free-text value that is safe inside a double-quoted script literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScriptValue(String);

impl ScriptValue {
    /// Validate `value` for interpolation into `'[[attr "value"]]'`
    ///
    /// # Errors
    /// `InvalidAttributeError` when `value` contains a quote, a backslash or a
    /// control character.
    pub fn parse(attribute: &str, value: &str) -> Result<Self, InvalidAttributeError> {
        if let Some(bad) = value
            .chars()
            .find(|c| matches!(c, '\'' | '"' | '\\') || c.is_control())
        {
            return Err(InvalidAttributeError::new(
                attribute,
                value,
                format!("character {bad:?} cannot appear in an admin script literal"),
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// Borrow the value text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A credential that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The credential itself. Only the runner should call this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_allowed_charset() {
        assert!(Identifier::parse("cell", "dmgrCell01").is_ok());
        assert!(Identifier::parse("server", "app-server_1.a").is_ok());
    }

    #[test]
    fn identifier_rejects_quotes_and_spaces() {
        let err = Identifier::parse("cluster", "bad'name").unwrap_err();
        assert_eq!(err.attribute, "cluster");
        assert_eq!(err.value, "bad'name");
        assert!(Identifier::parse("cluster", "two words").is_err());
        assert!(Identifier::parse("cluster", "").is_err());
        assert!(Identifier::parse("cluster", "a]b").is_err());
    }

    #[test]
    fn script_value_rejects_literal_breakers() {
        assert!(ScriptValue::parse("jvm_generic_jvm_arguments", "-Xgcpolicy:gencon -Dx=1").is_ok());
        assert!(ScriptValue::parse("jvm_debug_args", "-Dfoo=\"bar\"").is_err());
        assert!(ScriptValue::parse("jvm_debug_args", "it's").is_err());
        assert!(ScriptValue::parse("jvm_debug_args", "a\\b").is_err());
        assert!(ScriptValue::parse("jvm_debug_args", "line\nbreak").is_err());
    }

    #[test]
    fn raw_values_coerce_to_text() {
        assert_eq!(RawValue::Flag(true).to_text(), "true");
        assert_eq!(RawValue::Integer(1024).to_text(), "1024");
        assert_eq!(RawValue::from("022").to_text(), "022");
    }

    #[test]
    fn canonical_flag_lowercases_boolean_spellings_only() {
        assert_eq!(canonical_flag("TRUE"), "true");
        assert_eq!(canonical_flag(" False "), "false");
        assert_eq!(canonical_flag("yes"), "yes");
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(****)");
        assert_eq!(secret.expose(), "hunter2");
    }
}
