//! Lazily connected, shared coordination session.

use crate::{
    ClusterError,
    coordination::{
        connector::Connector,
        r#trait::{Coordination, NodeReply, Status},
    },
};
use log::info;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to the coordination service.
///
/// The first operation connects through the configured `Connector`. The
/// connection lock is only held while establishing or tearing down the
/// connection; node operations run concurrently on a cloned client handle.
pub struct CoordinationSession {
    address: String,
    session_timeout: Option<Duration>,
    connector: Arc<dyn Connector>,
    client: Mutex<Option<Arc<dyn Coordination>>>,
}

impl CoordinationSession {
    pub fn new(
        address: impl Into<String>,
        session_timeout: Option<Duration>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            address: address.into(),
            session_timeout,
            connector,
            client: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connect if not connected yet. Concurrent first calls establish exactly one connection.
    pub fn connect(&self) -> Result<Arc<dyn Coordination>, ClusterError> {
        let mut client = self.client.lock();
        if let Some(existing) = client.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let connection = self.connector.connect(&self.address, self.session_timeout)?;
        info!("Connected to coordination service at {}", self.address);
        *client = Some(Arc::clone(&connection));
        Ok(connection)
    }

    pub fn is_connected(&self) -> bool {
        self.client.lock().is_some()
    }

    /// Release the connection. The next operation reconnects.
    pub fn close(&self) {
        if let Some(client) = self.client.lock().take() {
            client.close();
            info!("Closed coordination session to {}", self.address);
        }
    }

    pub fn list_children(&self, path: &str) -> Result<NodeReply<Vec<String>>, ClusterError> {
        Ok(self.connect()?.list_children(path))
    }

    pub fn read(&self, path: &str) -> Result<NodeReply<Vec<u8>>, ClusterError> {
        Ok(self.connect()?.read(path))
    }

    pub fn create(&self, path: &str, payload: Option<&[u8]>) -> Result<Status, ClusterError> {
        Ok(self.connect()?.create(path, payload))
    }

    pub fn delete(&self, path: &str) -> Result<Status, ClusterError> {
        Ok(self.connect()?.delete(path))
    }

    pub fn set(&self, path: &str, payload: &[u8]) -> Result<Status, ClusterError> {
        Ok(self.connect()?.set(path, payload))
    }

    pub fn stat(&self, path: &str) -> Result<Status, ClusterError> {
        Ok(self.connect()?.stat(path))
    }

    /// Read and decode a JSON payload; any non-OK status is an `Operation` error.
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClusterError> {
        let payload = self.read(path)?.into_result(path)?;
        serde_json::from_slice(&payload).map_err(|e| ClusterError::from_payload_error(e, path))
    }
}

impl std::fmt::Debug for CoordinationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationSession")
            .field("address", &self.address)
            .field("session_timeout", &self.session_timeout)
            .field("connected", &self.is_connected())
            .finish()
    }
}
