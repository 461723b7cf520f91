//! Topics: replica assignment, configuration, creation and deletion.

use crate::{
    ClusterError,
    cache::LazyCache,
    config::TopicPreload,
    coordination::{CoordinationSession, Status, path},
    fetcher::ConcurrentFetcher,
    model::Partition,
    schema::{
        DELETE_TOPICS_PATH, PAYLOAD_VERSION, TOPIC_CONFIG_PATH, TOPICS_PATH, TopicAssignmentNode,
        TopicConfigNode,
    },
    tree::NodeTreeManager,
    types::{BrokerId, PartitionId},
};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Longest topic name the brokers accept.
pub const MAX_TOPIC_NAME_LEN: usize = 249;

/// Handle to a topic.
///
/// Partitions and configuration are read on first use (or during discovery,
/// depending on the preload selection) and kept until `reset`.
#[derive(Debug)]
pub struct Topic {
    name: String,
    session: Weak<CoordinationSession>,
    fetcher: ConcurrentFetcher,
    partitions: LazyCache<Vec<Partition>>,
    config: LazyCache<BTreeMap<String, String>>,
}

impl Topic {
    /// An unregistered handle; performs no remote call.
    pub fn new(
        name: impl Into<String>,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
    ) -> Self {
        Self {
            name: name.into(),
            session: Arc::downgrade(session),
            fetcher,
            partitions: LazyCache::new(),
            config: LazyCache::new(),
        }
    }

    /// A handle with the `preload` selection already fetched.
    pub fn load(
        name: impl Into<String>,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
        preload: TopicPreload,
    ) -> Result<Self, ClusterError> {
        let topic = Self::new(name, session, fetcher);
        if preload.partitions {
            topic.partitions()?;
        }
        if preload.config {
            topic.config()?;
        }
        Ok(topic)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_path(&self) -> String {
        path::join(TOPICS_PATH, &self.name)
    }

    pub fn config_path(&self) -> String {
        path::join(TOPIC_CONFIG_PATH, &self.name)
    }

    fn session(&self) -> Result<Arc<CoordinationSession>, ClusterError> {
        self.session.upgrade().ok_or(ClusterError::Detached)
    }

    pub fn exists(&self) -> Result<bool, ClusterError> {
        let node_path = self.node_path();
        match self.session()?.stat(&node_path)? {
            Status::Ok => Ok(true),
            Status::NoNode => Ok(false),
            status => Err(ClusterError::operation(&node_path, status)),
        }
    }

    /// Every partition, ordered by index, with its current leader and ISR.
    pub fn partitions(&self) -> Result<Arc<Vec<Partition>>, ClusterError> {
        self.partitions.get_or_try_load(|| self.fetch_partitions())
    }

    fn fetch_partitions(&self) -> Result<Vec<Partition>, ClusterError> {
        let session = self.session()?;
        let node_path = self.node_path();
        let assignment: TopicAssignmentNode = session.read_json(&node_path)?;

        let assigned = assignment
            .partitions
            .into_iter()
            .map(|(index, replicas)| {
                index
                    .parse::<PartitionId>()
                    .map(|id| (id, replicas))
                    .map_err(|reason| ClusterError::InvalidPayload {
                        path: node_path.clone(),
                        reason,
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let by_id = self.fetcher.fetch(assigned.keys().copied().collect(), |id| {
            Partition::fetch(&session, &self.name, *id, assigned[id].clone())
        })?;
        Ok(by_id.into_values().collect())
    }

    pub fn partition_count(&self) -> Result<usize, ClusterError> {
        Ok(self.partitions()?.len())
    }

    /// Replica count of the first partition; zero for a topic without partitions.
    pub fn replication_factor(&self) -> Result<usize, ClusterError> {
        Ok(self
            .partitions()?
            .first()
            .map_or(0, |p| p.replicas().len()))
    }

    pub fn under_replicated(&self) -> Result<bool, ClusterError> {
        Ok(self.partitions()?.iter().any(Partition::under_replicated))
    }

    /// Configuration overrides. A topic without a config node has none.
    pub fn config(&self) -> Result<Arc<BTreeMap<String, String>>, ClusterError> {
        self.config.get_or_try_load(|| {
            let session = self.session()?;
            let config_path = self.config_path();
            let reply = session.read(&config_path)?;
            match reply.status {
                Status::Ok => serde_json::from_slice::<TopicConfigNode>(&reply.data)
                    .map(|node| node.config)
                    .map_err(|e| ClusterError::from_payload_error(e, &config_path)),
                Status::NoNode => Ok(BTreeMap::new()),
                status => Err(ClusterError::operation(&config_path, status)),
            }
        })
    }

    /// Drop cached partitions and configuration so the next query reads live state.
    pub fn reset(&self) {
        self.partitions.reset();
        self.config.reset();
    }

    /// Register this topic with `partitions` partitions of `replication_factor`
    /// replicas each, assigned round-robin over `brokers`.
    pub fn create(
        &self,
        brokers: &[BrokerId],
        partitions: u32,
        replication_factor: u32,
        config: BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        validate_name(&self.name)?;
        validate_counts(partitions, replication_factor)?;
        let mut brokers = brokers.to_vec();
        brokers.sort();
        brokers.dedup();
        if replication_factor as usize > brokers.len() {
            return Err(ClusterError::validation(
                "replication_factor",
                format!(
                    "{replication_factor} exceeds the {} available brokers",
                    brokers.len()
                ),
            ));
        }

        let session = self.session()?;
        let node_path = self.node_path();
        if self.exists()? {
            return Err(ClusterError::Conflict { path: node_path });
        }

        let assignment = assign_replicas(&brokers, partitions, replication_factor);
        let config_node = TopicConfigNode {
            version: PAYLOAD_VERSION,
            config,
        };
        let config_path = self.config_path();
        let config_payload = serde_json::to_vec(&config_node)
            .map_err(|e| ClusterError::from_payload_error(e, &config_path))?;
        let assignment_payload = serde_json::to_vec(&assignment)
            .map_err(|e| ClusterError::from_payload_error(e, &node_path))?;

        let tree = NodeTreeManager::new(&session, self.fetcher);
        tree.recursive_create(TOPIC_CONFIG_PATH)?;
        write_node(&session, &config_path, &config_payload)?;
        tree.recursive_create(TOPICS_PATH)?;
        create_node(&session, &node_path, &assignment_payload)?;

        self.reset();
        info!(
            "Created topic '{}' with {partitions} partitions, replication factor {replication_factor}",
            self.name
        );
        Ok(())
    }

    /// Mark this topic for deletion. The controller performs the deletion.
    pub fn destroy(&self) -> Result<(), ClusterError> {
        let session = self.session()?;
        let marker = path::join(DELETE_TOPICS_PATH, &self.name);
        NodeTreeManager::new(&session, self.fetcher).recursive_create(DELETE_TOPICS_PATH)?;

        match session.create(&marker, None)? {
            Status::Ok | Status::NodeExists => {
                info!("Marked topic '{}' for deletion", self.name);
                Ok(())
            }
            status => Err(ClusterError::operation(&marker, status)),
        }
    }
}

fn create_node(
    session: &CoordinationSession,
    node_path: &str,
    payload: &[u8],
) -> Result<(), ClusterError> {
    match session.create(node_path, Some(payload))? {
        Status::Ok => Ok(()),
        status => Err(ClusterError::operation(node_path, status)),
    }
}

/// Create `node_path`, or overwrite its payload if it is already there.
fn write_node(
    session: &CoordinationSession,
    node_path: &str,
    payload: &[u8],
) -> Result<(), ClusterError> {
    match session.create(node_path, Some(payload))? {
        Status::Ok => Ok(()),
        Status::NodeExists => match session.set(node_path, payload)? {
            Status::Ok => Ok(()),
            status => Err(ClusterError::operation(node_path, status)),
        },
        status => Err(ClusterError::operation(node_path, status)),
    }
}

/// Partition and replica counts must both be positive.
pub fn validate_counts(partitions: u32, replication_factor: u32) -> Result<(), ClusterError> {
    if partitions == 0 {
        return Err(ClusterError::validation(
            "partitions",
            "must be a positive integer",
        ));
    }
    if replication_factor == 0 {
        return Err(ClusterError::validation(
            "replication_factor",
            "must be a positive integer",
        ));
    }
    Ok(())
}

/// Topic names are 1..=249 characters of `[a-zA-Z0-9._-]`, excluding `.` and `..`.
pub fn validate_name(name: &str) -> Result<(), ClusterError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ClusterError::validation("name", format!("'{name}' is not a legal topic name")));
    }
    if name.len() > MAX_TOPIC_NAME_LEN {
        return Err(ClusterError::validation(
            "name",
            format!("longer than {MAX_TOPIC_NAME_LEN} characters"),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(ClusterError::validation(
            "name",
            format!("'{name}' contains illegal character '{c}'"),
        ));
    }
    Ok(())
}

/// Round-robin assignment over sorted, distinct broker ids; partition `p`
/// starts at broker `p mod n`.
fn assign_replicas(
    brokers: &[BrokerId],
    partitions: u32,
    replication_factor: u32,
) -> TopicAssignmentNode {
    let partitions = (0..partitions as usize)
        .map(|p| {
            let replicas = (0..replication_factor as usize)
                .map(|r| brokers[(p + r) % brokers.len()])
                .collect();
            (p.to_string(), replicas)
        })
        .collect();

    TopicAssignmentNode {
        version: PAYLOAD_VERSION,
        partitions,
    }
}
