//! Lazy discovery and caching of brokers, topics and consumer groups.

use crate::test_utilities::*;
use keel::{BrokerId, ClusterConfig, ClusterError, InMemoryCoordination, Status, TopicPreload};
use std::sync::Arc;
use test_log::test;

#[test]
fn test_brokers_discovered_once() {
    let (connector, cluster) = recording_cluster(kafka_tree());
    let backend = connector.backend();

    let first = cluster.brokers().unwrap();
    let second = cluster.brokers().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        first.keys().copied().collect::<Vec<_>>(),
        vec![BrokerId(1), BrokerId(2), BrokerId(3)]
    );
    assert_eq!(backend.count_of(Op::ListChildren, "/brokers/ids"), 1);
    assert_eq!(backend.count_of(Op::Read, "/brokers/ids/2"), 1);
    assert_eq!(connector.connect_count(), 1);
}

#[test]
fn test_reset_triggers_exactly_one_rediscovery() {
    let (connector, cluster) = recording_cluster(kafka_tree());
    let backend = connector.backend();

    cluster.brokers().unwrap();
    cluster.reset_metadata();
    assert_eq!(cluster.loaded_metadata(), (false, false, false));

    cluster.brokers().unwrap();
    cluster.brokers().unwrap();
    assert_eq!(backend.count_of(Op::ListChildren, "/brokers/ids"), 2);
}

#[test]
fn test_reset_picks_up_new_brokers() {
    let (connector, cluster) = recording_cluster(kafka_tree());

    assert_eq!(cluster.brokers().unwrap().len(), 3);
    connector
        .backend()
        .tree()
        .put("/brokers/ids/4", broker_payload("kafka4", 9092));
    assert_eq!(cluster.brokers().unwrap().len(), 3);

    cluster.reset_metadata();
    assert_eq!(cluster.brokers().unwrap().len(), 4);
}

#[test]
fn test_concurrent_first_access_discovers_once() {
    let (connector, cluster) = recording_cluster(kafka_tree());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                assert_eq!(cluster.brokers().unwrap().len(), 3);
                assert_eq!(cluster.topics().unwrap().len(), 2);
            });
        }
    });

    let backend = connector.backend();
    assert_eq!(backend.count_of(Op::ListChildren, "/brokers/ids"), 1);
    assert_eq!(backend.count_of(Op::ListChildren, "/brokers/topics"), 1);
    assert_eq!(connector.connect_count(), 1);
}

#[test]
fn test_failed_batch_caches_nothing() {
    let (connector, cluster) = recording_cluster(many_topics_tree(50));
    let backend = connector.backend();
    backend.fail(
        Op::Read,
        "/brokers/topics/topic-017/partitions/0/state",
        Status::NoAuth,
    );

    let err = cluster.topics().unwrap_err();
    assert_eq!(err.status(), Some(Status::NoAuth));
    assert!(!cluster.loaded_metadata().1);

    backend.clear_faults();
    let topics = cluster.topics().unwrap();
    assert_eq!(topics.len(), 50);
    assert_eq!(backend.count_of(Op::ListChildren, "/brokers/topics"), 2);
}

#[test]
fn test_missing_broker_root_is_configuration_error() {
    let (_connector, cluster) = recording_cluster(InMemoryCoordination::new());

    let err = cluster.brokers().unwrap_err();
    assert!(matches!(err, ClusterError::Configuration { ref address, .. } if address == "zk1:2181/kafka"));
    assert!(!cluster.loaded_metadata().0);
}

#[test]
fn test_missing_topic_root_is_operation_error() {
    let tree = InMemoryCoordination::new();
    tree.put("/brokers/ids/1", broker_payload("kafka1", 9092));
    let (_connector, cluster) = recording_cluster(tree);

    let err = cluster.topics().unwrap_err();
    assert_eq!(err.status(), Some(Status::NoNode));
    assert_eq!(cluster.brokers().unwrap().len(), 1);
}

#[test]
fn test_default_preload_fetches_partitions_only() {
    let (connector, cluster) = recording_cluster(kafka_tree());
    let backend = connector.backend();

    cluster.topics().unwrap();
    assert_eq!(
        backend.count_of(Op::Read, "/brokers/topics/orders/partitions/1/state"),
        1
    );
    assert_eq!(backend.count_of(Op::Read, "/config/topics/orders"), 0);

    // Served from the preloaded topic cache.
    let topics = cluster.topics().unwrap();
    assert_eq!(topics["orders"].partition_count().unwrap(), 3);
    assert_eq!(
        backend.count_of(Op::Read, "/brokers/topics/orders/partitions/1/state"),
        1
    );
}

#[test]
fn test_preload_none_defers_partition_reads() {
    let config = ClusterConfig::new("zk1:2181/kafka").with_preload(TopicPreload::none());
    let (connector, cluster) = recording_cluster_with(kafka_tree(), config);
    let backend = connector.backend();

    let topics = cluster.topics().unwrap();
    assert_eq!(topics.len(), 2);
    assert!(backend.paths_of(Op::Read).is_empty());

    assert_eq!(topics["orders"].replication_factor().unwrap(), 2);
    assert_eq!(
        backend.count_of(Op::Read, "/brokers/topics/orders/partitions/0/state"),
        1
    );
}

#[test]
fn test_preload_all_reads_config() {
    let (connector, cluster) = recording_cluster(kafka_tree());

    let topics = cluster.topics_with_preload(TopicPreload::all()).unwrap();
    assert_eq!(
        connector
            .backend()
            .count_of(Op::Read, "/config/topics/orders"),
        1
    );
    assert_eq!(topics["orders"].config().unwrap()["retention.ms"], "86400000");
    assert!(topics["audit"].config().unwrap().is_empty());
}

#[test]
fn test_close_resets_caches_and_reconnects() {
    let (connector, cluster) = recording_cluster(kafka_tree());

    cluster.brokers().unwrap();
    cluster.consumergroups().unwrap();
    assert_eq!(cluster.loaded_metadata(), (true, false, true));

    cluster.close();
    assert_eq!(cluster.loaded_metadata(), (false, false, false));

    cluster.brokers().unwrap();
    assert_eq!(connector.connect_count(), 2);
}
