//! Registered brokers.

use crate::{
    ClusterError,
    coordination::{CoordinationSession, path},
    model::Partition,
    schema::{BROKER_IDS_PATH, BrokerDescriptor},
    types::BrokerId,
};
use chrono::{DateTime, Utc};

/// A broker as registered under `/brokers/ids/{id}`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Broker {
    id: BrokerId,
    host: String,
    port: u16,
    jmx_port: Option<i32>,
    registered_at: Option<DateTime<Utc>>,
    endpoints: Vec<String>,
    rack: Option<String>,
}

impl Broker {
    /// Read and decode the registration node of broker `id`.
    pub fn fetch(session: &CoordinationSession, id: BrokerId) -> Result<Self, ClusterError> {
        let node_path = Self::node_path(id);
        let payload = session.read(&node_path)?.into_result(&node_path)?;
        Self::from_node(id, &node_path, &payload)
    }

    /// Decode a broker from its raw registration payload.
    pub fn from_node(id: BrokerId, node_path: &str, payload: &[u8]) -> Result<Self, ClusterError> {
        let descriptor: BrokerDescriptor = serde_json::from_slice(payload)
            .map_err(|e| ClusterError::from_payload_error(e, node_path))?;
        Self::from_descriptor(id, node_path, descriptor)
    }

    fn from_descriptor(
        id: BrokerId,
        node_path: &str,
        descriptor: BrokerDescriptor,
    ) -> Result<Self, ClusterError> {
        let (host, port) = match (descriptor.host, u16::try_from(descriptor.port)) {
            (Some(host), Ok(port)) if port > 0 => (host, port),
            _ => descriptor
                .endpoints
                .iter()
                .find_map(|endpoint| parse_endpoint(endpoint))
                .ok_or_else(|| ClusterError::InvalidPayload {
                    path: node_path.to_string(),
                    reason: "no usable host/port or endpoint".to_string(),
                })?,
        };

        let registered_at = descriptor
            .timestamp
            .as_deref()
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        Ok(Self {
            id,
            host,
            port,
            jmx_port: descriptor.jmx_port.filter(|p| *p > 0),
            registered_at,
            endpoints: descriptor.endpoints,
            rack: descriptor.rack,
        })
    }

    pub fn node_path(id: BrokerId) -> String {
        path::join(BROKER_IDS_PATH, &id.to_string())
    }

    pub fn id(&self) -> BrokerId {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn jmx_port(&self) -> Option<i32> {
        self.jmx_port
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn rack(&self) -> Option<&str> {
        self.rack.as_deref()
    }

    /// Partitions this broker currently leads.
    pub fn led_partitions<'p>(&self, partitions: &'p [Partition]) -> Vec<&'p Partition> {
        partitions
            .iter()
            .filter(|p| p.leader() == Some(self.id))
            .collect()
    }

    /// Partitions this broker is an assigned replica of.
    pub fn replicated_partitions<'p>(&self, partitions: &'p [Partition]) -> Vec<&'p Partition> {
        partitions
            .iter()
            .filter(|p| p.replicas().contains(&self.id))
            .collect()
    }

    /// Whether losing this broker would leave some partition with fewer than
    /// `replicas` in-sync replicas.
    pub fn is_critical(&self, partitions: &[Partition], replicas: usize) -> bool {
        partitions
            .iter()
            .any(|p| p.isr().contains(&self.id) && p.isr().len() <= replicas)
    }
}

/// Split `PROTOCOL://host:port` into host and port.
fn parse_endpoint(endpoint: &str) -> Option<(String, u16)> {
    let address = endpoint.split_once("://").map_or(endpoint, |(_, rest)| rest);
    let (host, port) = address.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = port.parse::<u16>().ok().filter(|p| *p > 0)?;
    (!host.is_empty()).then(|| (host.to_string(), port))
}
