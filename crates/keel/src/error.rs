//! Error types for cluster metadata operations.

use crate::coordination::Status;
use std::fmt;

/// Main error type for cluster metadata operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// The coordination service has no cluster registered at the expected root.
    Configuration {
        address: String,
        reason: String,
    },
    /// A caller-supplied argument failed a precondition.
    Validation {
        field: String,
        message: String,
    },
    /// An admin node already exists, meaning the operation is still in flight.
    Conflict {
        path: String,
    },
    /// A coordination call returned a status this layer does not recover from.
    Operation {
        path: String,
        status: Status,
    },
    /// A node payload could not be decoded.
    InvalidPayload {
        path: String,
        reason: String,
    },
    /// Configuration file I/O or parse error.
    ConfigFile {
        context: String,
        reason: String,
    },
    /// The owning cluster was dropped while a handle was still in use.
    Detached,
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::Configuration { address, reason } => {
                write!(f, "Cluster configuration error at '{address}': {reason}")
            }
            ClusterError::Validation { field, message } => {
                write!(f, "Invalid {field}: {message}")
            }
            ClusterError::Conflict { path } => {
                write!(f, "Operation already in progress: '{path}' exists")
            }
            ClusterError::Operation { path, status } => {
                write!(
                    f,
                    "Coordination operation on '{path}' failed with {status} (code {})",
                    status.code()
                )
            }
            ClusterError::InvalidPayload { path, reason } => {
                write!(f, "Invalid payload at '{path}': {reason}")
            }
            ClusterError::ConfigFile { context, reason } => {
                write!(f, "Configuration error in {context}: {reason}")
            }
            ClusterError::Detached => {
                write!(f, "Cluster handle has been dropped")
            }
        }
    }
}

impl std::error::Error for ClusterError {}

impl ClusterError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict { .. })
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClusterError::Validation { .. }
                | ClusterError::Conflict { .. }
                | ClusterError::ConfigFile { .. }
        )
    }

    /// The raw coordination status behind an `Operation` error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            ClusterError::Operation { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ClusterError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn operation(path: &str, status: Status) -> Self {
        ClusterError::Operation {
            path: path.to_string(),
            status,
        }
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        ClusterError::ConfigFile {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_parse_error(e: impl std::fmt::Display, context: &str) -> Self {
        ClusterError::ConfigFile {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_payload_error(e: impl std::fmt::Display, path: &str) -> Self {
        ClusterError::InvalidPayload {
            path: path.to_string(),
            reason: e.to_string(),
        }
    }
}
