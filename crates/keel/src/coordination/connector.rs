//! Connection establishment for coordination backends.

use crate::{
    ClusterError,
    coordination::{memory::InMemoryCoordination, r#trait::Coordination},
};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Establishes a connection to a coordination service.
///
/// A wire client implements this to open a session against `address`; the
/// session layer calls it at most once per connection lifetime.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        address: &str,
        session_timeout: Option<Duration>,
    ) -> Result<Arc<dyn Coordination>, ClusterError>;
}

/// Connector that hands out one shared in-memory tree.
///
/// The tree outlives individual connections, so closing and reconnecting a
/// session observes the same nodes.
#[derive(Debug)]
pub struct MemoryConnector {
    tree: Arc<InMemoryCoordination>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(tree: InMemoryCoordination) -> Self {
        Self::with_shared(Arc::new(tree))
    }

    pub fn with_shared(tree: Arc<InMemoryCoordination>) -> Self {
        Self {
            tree,
            connects: AtomicUsize::new(0),
        }
    }

    /// The backing tree, for seeding and inspection.
    pub fn tree(&self) -> &Arc<InMemoryCoordination> {
        &self.tree
    }

    /// How many connections have been established so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new(InMemoryCoordination::new())
    }
}

impl Connector for MemoryConnector {
    fn connect(
        &self,
        address: &str,
        _session_timeout: Option<Duration>,
    ) -> Result<Arc<dyn Coordination>, ClusterError> {
        let count = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Opened in-memory coordination session for {address} (connection #{count})");
        let tree: Arc<dyn Coordination> = self.tree.clone();
        Ok(tree)
    }
}
