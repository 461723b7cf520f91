//! In-memory coordination tree.

use crate::coordination::{
    path::{self, ROOT},
    r#trait::{Coordination, NodeReply, Status},
};
use log::{debug, trace};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seed data for an in-memory tree: absolute path to payload.
///
/// String payloads are stored verbatim, `null` as an empty payload and any other
/// JSON value in its serialized form. Missing ancestors are created empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSnapshot {
    pub nodes: BTreeMap<String, serde_json::Value>,
}

/// In-memory implementation of the Coordination trait.
///
/// Nodes live in an ordered map keyed by absolute path, so the children of a
/// node are a contiguous key range. Suitable for tests, development and
/// offline inspection of a captured tree.
#[derive(Debug)]
pub struct InMemoryCoordination {
    nodes: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryCoordination {
    /// Create a tree containing only the root node.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT.to_string(), Vec::new());
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Create a tree seeded from a snapshot.
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Self {
        let tree = Self::new();
        for (node_path, value) in snapshot.nodes {
            let payload = match value {
                serde_json::Value::Null => Vec::new(),
                serde_json::Value::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            };
            tree.put(&node_path, payload);
        }
        tree
    }

    /// Store `payload` at `path`, creating missing ancestors and overwriting any
    /// existing payload. Invalid paths are ignored.
    pub fn put(&self, node_path: &str, payload: impl Into<Vec<u8>>) {
        if !path::is_valid(node_path) {
            debug!("Ignoring invalid seed path '{node_path}'");
            return;
        }
        let mut nodes = self.nodes.write();
        let mut ancestor = path::parent_of(node_path);
        while let Some(p) = ancestor {
            nodes.entry(p.to_string()).or_default();
            ancestor = path::parent_of(p);
        }
        nodes.insert(node_path.to_string(), payload.into());
    }

    /// Number of nodes in the tree, including the root.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn child_prefix(node_path: &str) -> String {
        if node_path == ROOT {
            ROOT.to_string()
        } else {
            format!("{node_path}/")
        }
    }

    fn children_of(nodes: &BTreeMap<String, Vec<u8>>, node_path: &str) -> Vec<String> {
        let prefix = Self::child_prefix(node_path);
        nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }
}

impl Default for InMemoryCoordination {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordination for InMemoryCoordination {
    fn list_children(&self, node_path: &str) -> NodeReply<Vec<String>> {
        if !path::is_valid(node_path) {
            return NodeReply::failed(Status::BadArguments);
        }
        let nodes = self.nodes.read();
        if !nodes.contains_key(node_path) {
            return NodeReply::failed(Status::NoNode);
        }
        NodeReply::new(Status::Ok, Self::children_of(&nodes, node_path))
    }

    fn read(&self, node_path: &str) -> NodeReply<Vec<u8>> {
        if !path::is_valid(node_path) {
            return NodeReply::failed(Status::BadArguments);
        }
        match self.nodes.read().get(node_path) {
            Some(payload) => NodeReply::new(Status::Ok, payload.clone()),
            None => NodeReply::failed(Status::NoNode),
        }
    }

    fn create(&self, node_path: &str, payload: Option<&[u8]>) -> Status {
        if !path::is_valid(node_path) || node_path == ROOT {
            return Status::BadArguments;
        }
        let mut nodes = self.nodes.write();
        if nodes.contains_key(node_path) {
            return Status::NodeExists;
        }
        let parent_exists = path::parent_of(node_path).is_some_and(|p| nodes.contains_key(p));
        if !parent_exists {
            return Status::NoNode;
        }
        trace!("Creating node {node_path}");
        nodes.insert(node_path.to_string(), payload.map(<[u8]>::to_vec).unwrap_or_default());
        Status::Ok
    }

    fn set(&self, node_path: &str, payload: &[u8]) -> Status {
        if !path::is_valid(node_path) {
            return Status::BadArguments;
        }
        match self.nodes.write().get_mut(node_path) {
            Some(existing) => {
                trace!("Setting payload of {node_path}");
                *existing = payload.to_vec();
                Status::Ok
            }
            None => Status::NoNode,
        }
    }

    fn delete(&self, node_path: &str) -> Status {
        if !path::is_valid(node_path) || node_path == ROOT {
            return Status::BadArguments;
        }
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(node_path) {
            return Status::NoNode;
        }
        if !Self::children_of(&nodes, node_path).is_empty() {
            return Status::NotEmpty;
        }
        trace!("Deleting node {node_path}");
        nodes.remove(node_path);
        Status::Ok
    }

    fn stat(&self, node_path: &str) -> Status {
        if !path::is_valid(node_path) {
            return Status::BadArguments;
        }
        if self.nodes.read().contains_key(node_path) {
            Status::Ok
        } else {
            Status::NoNode
        }
    }

    fn close(&self) {
        debug!("In-memory coordination tree released ({} nodes)", self.len());
    }
}
