//! wsadmin response text
//!
//! wsadmin mixes its own status messages (`WASX7209I: Connected to process
//! ...`) with the value a command returns. This module separates the two so
//! the prober only ever looks at the returned value.

use once_cell::sync::Lazy;
use regex::Regex;

static MESSAGE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Z]{4,5}\d{4})([IWE]):\s*(.*)$").expect("message pattern is valid")
});

static EXCEPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:[a-z_][a-z0-9_]*\.)+[A-Za-z_]*(?:Exception|Error))\b:?\s*(.*)$")
        .expect("exception pattern is valid")
});

/// Message codes meaning wsadmin never reached a server process
pub const SESSION_FAILURE_CODES: &[&str] = &["WASX7023E", "WASX7246E", "WASX7016E"];

/// Severity suffix of a message code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// `I`
    Info,
    /// `W`
    Warning,
    /// `E`, or a Java exception
    Error,
}

/// A status line printed by wsadmin itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// e.g. `WASX7209I`
    pub code: String,
    /// Parsed from the code suffix
    pub severity: Severity,
    /// Whole line
    pub line: String,
}

/// Raw output split into status messages and returned value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminResponse {
    messages: Vec<Message>,
    body: Vec<String>,
}

impl AdminResponse {
    /// Split raw wsadmin output
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut response = Self::default();
        for line in raw.lines() {
            if let Some(caps) = MESSAGE_LINE.captures(line) {
                let severity = match &caps[2] {
                    "I" => Severity::Info,
                    "W" => Severity::Warning,
                    _ => Severity::Error,
                };
                response.messages.push(Message {
                    code: format!("{}{}", &caps[1], &caps[2]),
                    severity,
                    line: line.trim().to_string(),
                });
            } else if let Some(caps) = EXCEPTION_LINE.captures(line) {
                response.messages.push(Message {
                    code: caps[1].to_string(),
                    severity: Severity::Error,
                    line: line.trim().to_string(),
                });
            } else if !line.trim().is_empty() {
                response.body.push(line.trim_end().to_string());
            }
        }
        response
    }

    /// First error message, if wsadmin reported one
    #[must_use]
    pub fn error(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.severity == Severity::Error)
    }

    /// All status messages
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returned value lines, status messages removed
    #[must_use]
    pub fn body_lines(&self) -> &[String] {
        &self.body
    }

    /// Returned value as one trimmed string
    #[must_use]
    pub fn body(&self) -> String {
        self.body.join("\n").trim().to_string()
    }
}

/// The message that shows wsadmin could not connect, if any
#[must_use]
pub fn session_failure(raw: &str) -> Option<String> {
    AdminResponse::parse(raw)
        .messages
        .into_iter()
        .find(|m| SESSION_FAILURE_CODES.contains(&m.code.as_str()))
        .map(|m| m.line)
}
