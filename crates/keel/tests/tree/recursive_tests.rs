use crate::test_utilities::*;
use keel::{ClusterConfig, Coordination, InMemoryCoordination, Status};
use std::collections::HashMap;
use test_log::test;

#[test]
fn test_recursive_create_parents_first() {
    let (connector, cluster) = recording_cluster(InMemoryCoordination::new());

    cluster.recursive_create("/a/b/c").unwrap();

    assert_eq!(
        connector.backend().paths_of(Op::Create),
        vec!["/a", "/a/b", "/a/b/c"]
    );
}

#[test]
fn test_recursive_create_existing_prefix() {
    let tree = InMemoryCoordination::new();
    tree.put("/a/b", "keep");
    let (connector, cluster) = recording_cluster(tree);

    cluster.recursive_create("/a/b/c/d").unwrap();
    assert_eq!(
        connector.backend().paths_of(Op::Create),
        vec!["/a/b/c", "/a/b/c/d"]
    );
    assert_eq!(connector.backend().tree().read("/a/b").data, b"keep");

    connector.backend().clear_calls();
    cluster.recursive_create("/a/b/c/d").unwrap();
    assert!(connector.backend().paths_of(Op::Create).is_empty());
}

#[test]
fn test_recursive_create_tolerates_racing_creator() {
    let (connector, cluster) = recording_cluster(InMemoryCoordination::new());
    // Another client creates the node between our stat and create.
    connector.backend().fail(Op::Create, "/a", Status::NodeExists);
    connector.backend().tree().put("/a", "");
    connector.backend().fail(Op::Stat, "/a", Status::NoNode);

    cluster.recursive_create("/a/b").unwrap();
    assert_eq!(connector.backend().tree().stat("/a/b"), Status::Ok);
}

#[test]
fn test_recursive_create_propagates_failure() {
    let (connector, cluster) = recording_cluster(InMemoryCoordination::new());
    connector.backend().fail(Op::Create, "/a/b", Status::NoAuth);

    let err = cluster.recursive_create("/a/b/c").unwrap_err();
    assert_eq!(err.status(), Some(Status::NoAuth));
    assert_eq!(
        connector.backend().paths_of(Op::Create),
        vec!["/a", "/a/b"]
    );
}

#[test]
fn test_recursive_delete_children_before_parents() {
    let tree = InMemoryCoordination::new();
    tree.put("/r/x/1", "");
    tree.put("/r/x/2", "");
    tree.put("/r/y", "");
    tree.put("/other", "");
    let (connector, cluster) = recording_cluster(tree);

    cluster.recursive_delete("/r").unwrap();

    let deletes = connector.backend().paths_of(Op::Delete);
    assert_eq!(deletes.len(), 5);
    assert_eq!(deletes.last().map(String::as_str), Some("/r"));

    let position: HashMap<&str, usize> = deletes
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    for (child, parent) in [("/r/x/1", "/r/x"), ("/r/x/2", "/r/x"), ("/r/x", "/r"), ("/r/y", "/r")] {
        assert!(position[child] < position[parent], "{child} deleted after {parent}");
    }

    let backend = connector.backend();
    assert_eq!(backend.tree().stat("/r"), Status::NoNode);
    assert_eq!(backend.tree().stat("/other"), Status::Ok);
}

#[test]
fn test_recursive_delete_missing_path() {
    let (connector, cluster) = recording_cluster(InMemoryCoordination::new());

    cluster.recursive_delete("/never/created").unwrap();
    assert_eq!(connector.backend().paths_of(Op::Delete), vec!["/never/created"]);
}

#[test]
fn test_overlapping_deletes_both_succeed() {
    let tree = InMemoryCoordination::new();
    for i in 0..20 {
        tree.put(&format!("/shared/group-{i}/offsets/orders/0"), "1");
    }
    let config = ClusterConfig::new("zk1:2181").with_fetch_workers(4);
    let (connector, cluster) = recording_cluster_with(tree, config);

    std::thread::scope(|scope| {
        let outer = scope.spawn(|| cluster.recursive_delete("/shared"));
        let inner = scope.spawn(|| cluster.recursive_delete("/shared/group-3"));
        outer.join().unwrap().unwrap();
        inner.join().unwrap().unwrap();
    });

    assert_eq!(connector.backend().tree().stat("/shared"), Status::NoNode);
}

#[test]
fn test_recursive_delete_stops_on_failure() {
    let tree = InMemoryCoordination::new();
    tree.put("/r/a/1", "");
    tree.put("/r/b", "");
    let (connector, cluster) = recording_cluster(tree);
    connector.backend().fail(Op::Delete, "/r/a/1", Status::NoAuth);

    let err = cluster.recursive_delete("/r").unwrap_err();
    assert_eq!(err.status(), Some(Status::NoAuth));

    // No shallower level is attempted after a failed level.
    let deletes = connector.backend().paths_of(Op::Delete);
    assert!(!deletes.iter().any(|p| p == "/r" || p == "/r/a"));
    assert_eq!(connector.backend().tree().stat("/r"), Status::Ok);
}
