use crate::test_utilities::*;
use keel::{BrokerId, ClusterError, PartitionId, PartitionRef};
use test_log::test;

#[test]
fn test_broker_registration_decoding() {
    let (_connector, cluster) = recording_cluster(kafka_tree());
    let brokers = cluster.brokers().unwrap();

    let broker = &brokers[&BrokerId(2)];
    assert_eq!(broker.host(), "kafka2");
    assert_eq!(broker.port(), 9092);
    assert_eq!(broker.addr(), "kafka2:9092");
    assert_eq!(broker.jmx_port(), None);
    assert_eq!(broker.endpoints(), ["PLAINTEXT://kafka2:9092"]);
    assert_eq!(
        broker.registered_at().map(|t| t.timestamp_millis()),
        Some(1_700_000_000_000)
    );
}

#[test]
fn test_secured_broker_uses_endpoint_address() {
    let tree = empty_cluster_tree();
    tree.put(
        "/brokers/ids/7",
        r#"{"jmx_port":-1,"timestamp":"1700000000000","endpoints":["SASL_SSL://kafka7.internal:9093"],"host":null,"version":4,"port":-1,"rack":"eu-west-1a"}"#,
    );
    let (_connector, cluster) = recording_cluster(tree);

    let brokers = cluster.brokers().unwrap();
    let broker = &brokers[&BrokerId(7)];
    assert_eq!(broker.addr(), "kafka7.internal:9093");
    assert_eq!(broker.rack(), Some("eu-west-1a"));
}

#[test]
fn test_undecodable_broker_fails_discovery() {
    let tree = kafka_tree();
    tree.put("/brokers/ids/4", "not json");
    let (_connector, cluster) = recording_cluster(tree);

    let err = cluster.brokers().unwrap_err();
    assert!(matches!(err, ClusterError::InvalidPayload { ref path, .. } if path == "/brokers/ids/4"));
}

#[test]
fn test_partition_roles() {
    let (_connector, cluster) = recording_cluster(kafka_tree());
    let brokers = cluster.brokers().unwrap();
    let partitions = cluster.partitions().unwrap();

    let refs: Vec<PartitionRef> = partitions.iter().map(|p| p.reference()).collect();
    assert_eq!(
        refs,
        vec![
            PartitionRef::new("audit", PartitionId(0)),
            PartitionRef::new("orders", PartitionId(0)),
            PartitionRef::new("orders", PartitionId(1)),
            PartitionRef::new("orders", PartitionId(2)),
        ]
    );

    let two = &brokers[&BrokerId(2)];
    let led: Vec<_> = two.led_partitions(&partitions).iter().map(|p| p.reference()).collect();
    assert_eq!(led, vec![PartitionRef::new("orders", PartitionId(1))]);
    assert_eq!(two.replicated_partitions(&partitions).len(), 3);
    assert!(two.is_critical(&partitions, 1));

    let one = &brokers[&BrokerId(1)];
    assert!(!one.is_critical(&partitions, 1));
    assert!(one.is_critical(&partitions, 2));
}

#[test]
fn test_controller_and_leaders() {
    let (_connector, cluster) = recording_cluster(kafka_tree());

    assert_eq!(cluster.controller().unwrap(), BrokerId(1));

    let leaders = cluster.leaders().unwrap();
    assert_eq!(leaders[&PartitionRef::new("orders", PartitionId(2))], Some(BrokerId(3)));
    assert_eq!(leaders[&PartitionRef::new("audit", PartitionId(0))], None);
    assert_eq!(leaders.len(), 4);
}

#[test]
fn test_missing_controller_is_operation_error() {
    let (_connector, cluster) = recording_cluster(empty_cluster_tree());

    let err = cluster.controller().unwrap_err();
    assert_eq!(err.status(), Some(keel::Status::NoNode));
}

#[test]
fn test_broker_zero_is_a_regular_broker() {
    let tree = empty_cluster_tree();
    tree.put("/brokers/ids/0", broker_payload("kafka0", 9092));
    tree.put("/brokers/ids/1", broker_payload("kafka1", 9092));
    put_topic(&tree, "orders", &[&[0, 1], &[1, 0]], &[(0, &[0, 1]), (0, &[1, 0])]);
    tree.put("/controller", r#"{"version":1,"brokerid":0,"timestamp":"1700000000000"}"#);
    let (_connector, cluster) = recording_cluster(tree);

    let brokers = cluster.brokers().unwrap();
    assert_eq!(brokers[&BrokerId(0)].addr(), "kafka0:9092");
    assert_eq!(cluster.controller().unwrap(), BrokerId(0));

    let leaders = cluster.leaders().unwrap();
    assert_eq!(
        leaders[&PartitionRef::new("orders", PartitionId(0))],
        Some(BrokerId(0))
    );
    let partitions = cluster.partitions().unwrap();
    assert!(!partitions[0].has_foreign_leader());
    assert!(partitions[1].has_foreign_leader());
}
