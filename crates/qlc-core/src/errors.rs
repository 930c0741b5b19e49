//! Structured error types shared across QLC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`QlcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (positions, shapes, counts, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type of the block compiler.
///
/// Each family corresponds to one failure category so that callers (and tests)
/// can dispatch on the kind of failure instead of the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum QlcError {
    /// A value was built from inconsistent parts (shape mismatch, empty
    /// composition, non-negative measurement offset, ...).
    #[error("construction error: {0}")]
    Construction(ErrorInfo),
    /// An operation was invoked before the state it depends on was computed.
    #[error("precondition error: {0}")]
    Precondition(ErrorInfo),
    /// The operation is structurally meaningless for the receiver.
    #[error("unsupported operation: {0}")]
    Unsupported(ErrorInfo),
    /// A detector referenced a measurement outside of the lookback window.
    #[error("lookback error: {0}")]
    Lookback(ErrorInfo),
    /// Detector database access or consistency errors.
    #[error("database error: {0}")]
    Database(ErrorInfo),
    /// Serialization, configuration and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl QlcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            QlcError::Construction(info)
            | QlcError::Precondition(info)
            | QlcError::Unsupported(info)
            | QlcError::Lookback(info)
            | QlcError::Database(info)
            | QlcError::Serde(info) => info,
        }
    }

    /// Returns the stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}
