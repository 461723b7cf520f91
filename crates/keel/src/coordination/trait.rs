//! Coordination service client contract.

use crate::ClusterError;
use std::fmt;

/// Status code returned by every coordination-service call.
///
/// Codes follow the ZooKeeper numbering so that a wire client can map its
/// return codes without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    SystemError,
    ConnectionLoss,
    OperationTimeout,
    BadArguments,
    NoNode,
    NoAuth,
    BadVersion,
    NodeExists,
    NotEmpty,
    SessionExpired,
    Other(i32),
}

impl Status {
    pub fn code(&self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::SystemError => -1,
            Status::ConnectionLoss => -4,
            Status::OperationTimeout => -7,
            Status::BadArguments => -8,
            Status::NoNode => -101,
            Status::NoAuth => -102,
            Status::BadVersion => -103,
            Status::NodeExists => -110,
            Status::NotEmpty => -111,
            Status::SessionExpired => -112,
            Status::Other(code) => *code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Status::Ok,
            -1 => Status::SystemError,
            -4 => Status::ConnectionLoss,
            -7 => Status::OperationTimeout,
            -8 => Status::BadArguments,
            -101 => Status::NoNode,
            -102 => Status::NoAuth,
            -103 => Status::BadVersion,
            -110 => Status::NodeExists,
            -111 => Status::NotEmpty,
            -112 => Status::SessionExpired,
            other => Status::Other(other),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Other(_) => write!(f, "UnknownStatus"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// Status plus payload, as returned by read-style calls.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReply<T> {
    pub status: Status,
    pub data: T,
}

impl<T> NodeReply<T> {
    pub fn new(status: Status, data: T) -> Self {
        Self { status, data }
    }

    /// Unwrap the payload of a successful reply, otherwise an `Operation` error for `path`.
    pub fn into_result(self, path: &str) -> Result<T, ClusterError> {
        match self.status {
            Status::Ok => Ok(self.data),
            status => Err(ClusterError::operation(path, status)),
        }
    }
}

impl<T: Default> NodeReply<T> {
    pub fn failed(status: Status) -> Self {
        Self {
            status,
            data: T::default(),
        }
    }
}

/// Client for a hierarchical coordination service.
///
/// Implementations must tolerate concurrent calls from many fetch workers.
/// Paths are absolute and `/`-separated; `/` itself always exists.
pub trait Coordination: Send + Sync {
    /// List the names (not full paths) of the direct children of `path`.
    fn list_children(&self, path: &str) -> NodeReply<Vec<String>>;

    /// Read the payload stored at `path`.
    fn read(&self, path: &str) -> NodeReply<Vec<u8>>;

    /// Create `path` with an optional payload. The parent must already exist.
    fn create(&self, path: &str, payload: Option<&[u8]>) -> Status;

    /// Replace the payload of an existing `path`.
    fn set(&self, path: &str, payload: &[u8]) -> Status;

    /// Delete `path`. Fails with `NotEmpty` if it still has children.
    fn delete(&self, path: &str) -> Status;

    /// Check whether `path` exists.
    fn stat(&self, path: &str) -> Status;

    /// Release the underlying connection.
    fn close(&self);
}
