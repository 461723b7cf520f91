//! Cluster façade over the coordination tree.

use crate::{
    ClusterError,
    cache::MetadataCache,
    config::{ClusterConfig, TopicPreload},
    coordination::{Connector, CoordinationSession},
    election,
    fetcher::ConcurrentFetcher,
    model::{Broker, Consumergroup, Partition, Topic, topic},
    schema::{CONTROLLER_PATH, ControllerNode, PartitionRef},
    tree::NodeTreeManager,
    types::BrokerId,
};
use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entry point for reading and administering a cluster's metadata.
///
/// Brokers, topics and consumer groups are discovered on first access and
/// cached until `reset_metadata` or `close`. All methods take `&self` and may
/// be called from many threads.
#[derive(Debug)]
pub struct Cluster {
    config: ClusterConfig,
    session: Arc<CoordinationSession>,
    fetcher: ConcurrentFetcher,
    cache: MetadataCache,
}

impl Cluster {
    /// Bind to the coordination service described by `config`. Connects lazily.
    pub fn new(config: ClusterConfig, connector: Arc<dyn Connector>) -> Result<Self, ClusterError> {
        config.validate()?;
        let session = Arc::new(CoordinationSession::new(
            config.address.clone(),
            config.session_timeout(),
            connector,
        ));
        Ok(Self {
            fetcher: ConcurrentFetcher::new(config.fetch_workers),
            config,
            session,
            cache: MetadataCache::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<CoordinationSession> {
        &self.session
    }

    pub fn brokers(&self) -> Result<Arc<BTreeMap<BrokerId, Broker>>, ClusterError> {
        self.cache.brokers(&self.session, self.fetcher)
    }

    /// Topics, preloading the configured selection.
    pub fn topics(&self) -> Result<Arc<BTreeMap<String, Topic>>, ClusterError> {
        self.topics_with_preload(self.config.preload)
    }

    pub fn topics_with_preload(
        &self,
        preload: TopicPreload,
    ) -> Result<Arc<BTreeMap<String, Topic>>, ClusterError> {
        self.cache.topics(&self.session, self.fetcher, preload)
    }

    pub fn consumergroups(&self) -> Result<Arc<BTreeMap<String, Consumergroup>>, ClusterError> {
        self.cache.consumergroups(&self.session, self.fetcher)
    }

    /// Handle to `name` without registering it or touching the service.
    pub fn topic(&self, name: impl Into<String>) -> Topic {
        Topic::new(name, &self.session, self.fetcher)
    }

    pub fn consumergroup(&self, name: impl Into<String>) -> Consumergroup {
        Consumergroup::new(name, &self.session, self.fetcher)
    }

    /// Create a topic with replicas spread over the currently known brokers.
    ///
    /// Counts are checked before any remote call. The topic cache is not
    /// refreshed; call `reset_metadata` to see the new topic in `topics()`.
    pub fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication_factor: i32,
        config: BTreeMap<String, String>,
    ) -> Result<Topic, ClusterError> {
        let partitions = u32::try_from(partitions).unwrap_or(0);
        let replication_factor = u32::try_from(replication_factor).unwrap_or(0);
        topic::validate_counts(partitions, replication_factor)?;
        topic::validate_name(name)?;

        let broker_ids: Vec<BrokerId> = self.brokers()?.keys().copied().collect();
        let topic = self.topic(name);
        topic.create(&broker_ids, partitions, replication_factor, config)?;
        Ok(topic)
    }

    /// All partitions of all cached topics, by topic name then partition index.
    pub fn partitions(&self) -> Result<Vec<Partition>, ClusterError> {
        let topics = self.topics()?;
        let mut partitions = Vec::new();
        for topic in topics.values() {
            partitions.extend(topic.partitions()?.iter().cloned());
        }
        Ok(partitions)
    }

    pub fn under_replicated(&self) -> Result<bool, ClusterError> {
        Ok(self.partitions()?.iter().any(Partition::under_replicated))
    }

    /// Current leader of every partition; `None` for leaderless partitions.
    pub fn leaders(&self) -> Result<BTreeMap<PartitionRef, Option<BrokerId>>, ClusterError> {
        Ok(self
            .partitions()?
            .iter()
            .map(|p| (p.reference(), p.leader()))
            .collect())
    }

    /// The broker currently acting as controller.
    pub fn controller(&self) -> Result<BrokerId, ClusterError> {
        let node: ControllerNode = self.session.read_json(CONTROLLER_PATH)?;
        Ok(node.brokerid)
    }

    /// Ask the controller to move leadership back to preferred replicas,
    /// for `partitions` or for every partition when `None`.
    pub fn preferred_leader_election(
        &self,
        partitions: Option<Vec<PartitionRef>>,
    ) -> Result<(), ClusterError> {
        let partitions = match partitions {
            Some(partitions) => partitions,
            None => self.partitions()?.iter().map(Partition::reference).collect(),
        };
        election::trigger_preferred_leader_election(&self.session, partitions)
    }

    pub fn recursive_create(&self, path: &str) -> Result<(), ClusterError> {
        NodeTreeManager::new(&self.session, self.fetcher).recursive_create(path)
    }

    pub fn recursive_delete(&self, path: &str) -> Result<(), ClusterError> {
        NodeTreeManager::new(&self.session, self.fetcher).recursive_delete(path)
    }

    pub fn reset_metadata(&self) {
        self.cache.reset();
    }

    /// Which caches currently hold discovered metadata: (brokers, topics, consumer groups).
    pub fn loaded_metadata(&self) -> (bool, bool, bool) {
        self.cache.loaded()
    }

    /// Close the session and drop cached metadata. Later calls reconnect.
    pub fn close(&self) {
        self.session.close();
        self.reset_metadata();
        info!("Cluster handle for {} closed", self.config.address);
    }
}
