//! Serialization schemas for node payloads.
//!
//! Every payload this crate reads or writes goes through one of these types,
//! so the JSON layout of the coordination tree is defined in one place.

use crate::types::{BrokerId, PartitionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version written into every payload this crate creates.
pub const PAYLOAD_VERSION: u32 = 1;

pub const BROKER_IDS_PATH: &str = "/brokers/ids";
pub const TOPICS_PATH: &str = "/brokers/topics";
pub const CONSUMERS_PATH: &str = "/consumers";
pub const TOPIC_CONFIG_PATH: &str = "/config/topics";
pub const DELETE_TOPICS_PATH: &str = "/admin/delete_topics";
pub const PREFERRED_ELECTION_PATH: &str = "/admin/preferred_replica_election";
pub const CONTROLLER_PATH: &str = "/controller";

/// Registered broker at `/brokers/ids/{id}`.
///
/// Brokers that only expose secured listeners register `host: null` and
/// `port: -1`, advertising their address through `endpoints` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerDescriptor {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "BrokerDescriptor::unset_port")]
    pub port: i32,
    #[serde(default)]
    pub jmx_port: Option<i32>,
    /// Registration time in epoch milliseconds, encoded as a string.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub rack: Option<String>,
}

impl BrokerDescriptor {
    fn unset_port() -> i32 {
        -1
    }
}

/// Replica assignment at `/brokers/topics/{topic}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssignmentNode {
    pub version: u32,
    /// Partition index (as a string key) to assigned replicas, preferred leader first.
    pub partitions: BTreeMap<String, Vec<BrokerId>>,
}

/// Leader and ISR at `/brokers/topics/{topic}/partitions/{partition}/state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStateNode {
    #[serde(default)]
    pub version: Option<u32>,
    /// `-1` when the partition has no leader.
    pub leader: i64,
    #[serde(default)]
    pub leader_epoch: i64,
    pub isr: Vec<BrokerId>,
    #[serde(default)]
    pub controller_epoch: i64,
}

impl PartitionStateNode {
    /// State of a partition the controller has not elected a leader for yet.
    pub fn unassigned() -> Self {
        Self {
            version: None,
            leader: -1,
            leader_epoch: 0,
            isr: Vec::new(),
            controller_epoch: 0,
        }
    }
}

/// Per-topic configuration overrides at `/config/topics/{topic}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfigNode {
    pub version: u32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Active controller at `/controller`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerNode {
    #[serde(default)]
    pub version: Option<u32>,
    pub brokerid: BrokerId,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One partition named in an admin request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionRef {
    pub topic: String,
    pub partition: PartitionId,
}

impl PartitionRef {
    pub fn new(topic: impl Into<String>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

/// Request body at `/admin/preferred_replica_election`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionRequest {
    pub version: u32,
    pub partitions: Vec<PartitionRef>,
}

impl ElectionRequest {
    pub fn new(partitions: Vec<PartitionRef>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            partitions,
        }
    }
}
