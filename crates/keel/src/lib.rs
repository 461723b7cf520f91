//! Keel: Kafka cluster metadata over a ZooKeeper-style coordination tree.
//!
//! This crate reads broker, topic, partition and consumer-group metadata from
//! the coordination service a Kafka cluster registers itself in, caches it
//! lazily, and performs the few administrative writes the tree supports:
//! topic creation and deletion, preferred leader elections and recursive
//! node management.

pub mod cache;
pub mod cluster;
pub mod config;
pub mod coordination;
pub mod election;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod schema;
pub mod telemetry;
pub mod tree;
pub mod types;

pub use cluster::Cluster;
pub use error::ClusterError;

// Re-export commonly used configuration and coordination types for ergonomics
pub use config::{ClusterConfig, ConfigLoader, TopicPreload};
pub use coordination::{
    Connector, Coordination, CoordinationSession, InMemoryCoordination, MemoryConnector, NodeReply,
    Status, TreeSnapshot,
};
pub use fetcher::ConcurrentFetcher;
pub use model::{Broker, Consumergroup, Partition, Topic};
pub use schema::PartitionRef;
pub use types::{BrokerId, PartitionId};

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
