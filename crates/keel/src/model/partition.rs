//! Topic partitions with their replica assignment and live leader/ISR state.

use crate::{
    ClusterError,
    coordination::{CoordinationSession, Status, path},
    schema::{PartitionRef, PartitionStateNode, TOPICS_PATH},
    types::{BrokerId, PartitionId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    topic: String,
    id: PartitionId,
    replicas: Vec<BrokerId>,
    leader: Option<BrokerId>,
    leader_epoch: i64,
    isr: Vec<BrokerId>,
}

impl Partition {
    /// Combine an assignment with a decoded state node.
    pub fn new(
        topic: impl Into<String>,
        id: PartitionId,
        replicas: Vec<BrokerId>,
        state: PartitionStateNode,
    ) -> Self {
        let leader = u32::try_from(state.leader).ok().map(BrokerId);
        Self {
            topic: topic.into(),
            id,
            replicas,
            leader,
            leader_epoch: state.leader_epoch,
            isr: state.isr,
        }
    }

    /// Read the state node of `topic`/`id` and combine it with `replicas`.
    ///
    /// A partition whose state node the controller has not written yet has
    /// no leader and an empty ISR.
    pub fn fetch(
        session: &CoordinationSession,
        topic: &str,
        id: PartitionId,
        replicas: Vec<BrokerId>,
    ) -> Result<Self, ClusterError> {
        let state_path = Self::state_path(topic, id);
        let reply = session.read(&state_path)?;
        let state = match reply.status {
            Status::Ok => serde_json::from_slice(&reply.data)
                .map_err(|e| ClusterError::from_payload_error(e, &state_path))?,
            Status::NoNode => PartitionStateNode::unassigned(),
            status => return Err(ClusterError::operation(&state_path, status)),
        };
        Ok(Self::new(topic, id, replicas, state))
    }

    pub fn state_path(topic: &str, id: PartitionId) -> String {
        format!(
            "{}/partitions/{id}/state",
            path::join(TOPICS_PATH, topic)
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    /// Assigned replicas, preferred leader first.
    pub fn replicas(&self) -> &[BrokerId] {
        &self.replicas
    }

    pub fn leader(&self) -> Option<BrokerId> {
        self.leader
    }

    pub fn leader_epoch(&self) -> i64 {
        self.leader_epoch
    }

    pub fn isr(&self) -> &[BrokerId] {
        &self.isr
    }

    pub fn preferred_leader(&self) -> Option<BrokerId> {
        self.replicas.first().copied()
    }

    pub fn has_leader(&self) -> bool {
        self.leader.is_some()
    }

    /// Whether the leader is not the preferred replica.
    pub fn has_foreign_leader(&self) -> bool {
        self.leader.is_some() && self.leader != self.preferred_leader()
    }

    pub fn under_replicated(&self) -> bool {
        self.isr.len() < self.replicas.len()
    }

    pub fn reference(&self) -> PartitionRef {
        PartitionRef::new(self.topic.clone(), self.id)
    }
}
