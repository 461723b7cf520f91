//! Consumer groups registered under `/consumers`.

use crate::{
    ClusterError,
    coordination::{CoordinationSession, Status, path},
    fetcher::ConcurrentFetcher,
    schema::CONSUMERS_PATH,
    tree::NodeTreeManager,
    types::PartitionId,
};
use log::info;
use std::sync::{Arc, Weak};

/// Handle to a consumer group. Building one performs no remote call; every
/// query reads live state.
#[derive(Debug, Clone)]
pub struct Consumergroup {
    name: String,
    session: Weak<CoordinationSession>,
    fetcher: ConcurrentFetcher,
}

impl Consumergroup {
    pub fn new(
        name: impl Into<String>,
        session: &Arc<CoordinationSession>,
        fetcher: ConcurrentFetcher,
    ) -> Self {
        Self {
            name: name.into(),
            session: Arc::downgrade(session),
            fetcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_path(&self) -> String {
        path::join(CONSUMERS_PATH, &self.name)
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

    /// Ids of the consumer instances currently registered.
    pub fn instances(&self) -> Result<Vec<String>, ClusterError> {
        self.children_or_empty(&format!("{}/ids", self.node_path()))
    }

    pub fn active(&self) -> Result<bool, ClusterError> {
        Ok(!self.instances()?.is_empty())
    }

    /// Topics this group has committed offsets for.
    pub fn topics(&self) -> Result<Vec<String>, ClusterError> {
        self.children_or_empty(&format!("{}/offsets", self.node_path()))
    }

    /// Committed offset for one partition, or `None` if nothing was committed.
    pub fn retrieve_offset(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Option<i64>, ClusterError> {
        let offset_path = format!("{}/offsets/{topic}/{partition}", self.node_path());
        let reply = self.session()?.read(&offset_path)?;
        match reply.status {
            Status::Ok => {
                let text = String::from_utf8_lossy(&reply.data);
                text.trim()
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|e| ClusterError::from_payload_error(e, &offset_path))
            }
            Status::NoNode => Ok(None),
            status => Err(ClusterError::operation(&offset_path, status)),
        }
    }

    /// Remove the group's registration. Refuses while instances are registered.
    pub fn destroy(&self) -> Result<(), ClusterError> {
        if self.active()? {
            return Err(ClusterError::validation(
                "consumergroup",
                format!("'{}' still has registered instances", self.name),
            ));
        }
        let session = self.session()?;
        NodeTreeManager::new(&session, self.fetcher).recursive_delete(&self.node_path())?;
        info!("Removed consumer group '{}'", self.name);
        Ok(())
    }

    fn children_or_empty(&self, parent: &str) -> Result<Vec<String>, ClusterError> {
        let reply = self.session()?.list_children(parent)?;
        match reply.status {
            Status::Ok => Ok(reply.data),
            Status::NoNode => Ok(Vec::new()),
            status => Err(ClusterError::operation(parent, status)),
        }
    }
}
