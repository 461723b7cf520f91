//! Recursive creation and deletion of node subtrees.

use crate::{
    ClusterError,
    coordination::{CoordinationSession, Status, path},
    fetcher::ConcurrentFetcher,
};
use log::{debug, trace};

/// Subtree operations built on plain session calls.
///
/// `NoNode` during deletion is treated as "already gone": overlapping deletes
/// of intersecting subtrees therefore both succeed instead of one failing
/// halfway. Creation tolerates `NodeExists` for the same reason.
#[derive(Debug, Clone, Copy)]
pub struct NodeTreeManager<'a> {
    session: &'a CoordinationSession,
    fetcher: ConcurrentFetcher,
}

impl<'a> NodeTreeManager<'a> {
    pub fn new(session: &'a CoordinationSession, fetcher: ConcurrentFetcher) -> Self {
        Self { session, fetcher }
    }

    /// Ensure `node_path` and all its ancestors exist, creating parents first.
    pub fn recursive_create(&self, node_path: &str) -> Result<(), ClusterError> {
        self.recursive_create_with(node_path, None)
    }

    /// As `recursive_create`, storing `payload` on the leaf if this call creates it.
    pub fn recursive_create_with(
        &self,
        node_path: &str,
        payload: Option<&[u8]>,
    ) -> Result<(), ClusterError> {
        match self.session.stat(node_path)? {
            Status::Ok => return Ok(()),
            Status::NoNode => {}
            status => return Err(ClusterError::operation(node_path, status)),
        }

        if let Some(parent) = path::parent_of(node_path) {
            if parent != path::ROOT {
                self.recursive_create(parent)?;
            }
        }

        match self.session.create(node_path, payload)? {
            Status::Ok => {
                trace!("Created {node_path}");
                Ok(())
            }
            Status::NodeExists => Ok(()),
            status => Err(ClusterError::operation(node_path, status)),
        }
    }

    /// Delete `node_path` and every descendant, children before parents.
    ///
    /// The subtree is walked one depth level at a time: each level's children
    /// are listed concurrently, then levels are deleted deepest first, each
    /// level concurrently. Concurrency per level is bounded by the fetcher.
    pub fn recursive_delete(&self, node_path: &str) -> Result<(), ClusterError> {
        let mut levels: Vec<Vec<String>> = vec![vec![node_path.to_string()]];

        loop {
            let Some(current) = levels.last() else { break };
            let listed = self
                .fetcher
                .fetch(current.clone(), |parent| self.child_paths(parent))?;
            let next: Vec<String> = listed.into_values().flatten().collect();
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }

        let total: usize = levels.iter().map(Vec::len).sum();
        debug!("Deleting {total} nodes under {node_path}");

        for level in levels.into_iter().rev() {
            self.fetcher.for_each(level, |node| self.delete_node(node))?;
        }
        Ok(())
    }

    fn child_paths(&self, parent: &str) -> Result<Vec<String>, ClusterError> {
        let reply = self.session.list_children(parent)?;
        match reply.status {
            Status::Ok => Ok(reply
                .data
                .iter()
                .map(|child| path::join(parent, child))
                .collect()),
            Status::NoNode => Ok(Vec::new()),
            status => Err(ClusterError::operation(parent, status)),
        }
    }

    fn delete_node(&self, node_path: &str) -> Result<(), ClusterError> {
        match self.session.delete(node_path)? {
            Status::Ok => {
                trace!("Deleted {node_path}");
                Ok(())
            }
            Status::NoNode => Ok(()),
            status => Err(ClusterError::operation(node_path, status)),
        }
    }
}
