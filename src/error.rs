//! Error types for acl-engine
//!
//! This module defines the error hierarchy used throughout the crate.
//! Decode failures carry the position and surrounding text of the encoded
//! ACL so corrupt stored data can be diagnosed from the message alone.

use std::fmt;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where in an encoded ACL a decode failure happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Cursor position at the time of failure
    pub position: usize,
    /// Characters surrounding the position
    pub snippet: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at position {} near '{}'", self.position, self.snippet)
    }
}

/// Errors raised while decoding or evaluating an ACL
///
/// Every variant is fatal to the call in progress; nothing is partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Truncated ACL: more input required {context}")]
    Truncated { context: ErrorContext },

    #[error("Malformed ACL: {reason} {context}")]
    Malformed {
        reason: String,
        context: ErrorContext,
    },

    #[error("Bad privilege flag '{flag}' {context}")]
    BadPrivilegeFlag { flag: char, context: ErrorContext },

    #[error("Bad who type '{kind}' {context}")]
    BadWhoType { kind: char, context: ErrorContext },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl AccessError {
    pub fn malformed(reason: impl Into<String>, context: ErrorContext) -> Self {
        Self::Malformed {
            reason: reason.into(),
            context,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Decode position the error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            AccessError::Truncated { context }
            | AccessError::Malformed { context, .. }
            | AccessError::BadPrivilegeFlag { context, .. }
            | AccessError::BadWhoType { context, .. } => Some(context.position),
            AccessError::InvalidState(_) => None,
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for decode and evaluation operations
pub type AccessResult<T> = std::result::Result<T, AccessError>;
