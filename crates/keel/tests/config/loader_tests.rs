use keel::{
    BrokerId, Cluster, ClusterConfig, ClusterError, ConfigLoader, InMemoryCoordination,
    MemoryConnector, TopicPreload, TreeSnapshot,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{Builder, NamedTempFile};
use test_log::test;

fn temp_file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_yaml_config() {
    let file = temp_file_with(
        ".yml",
        "address: zk1:2181,zk2:2181/kafka\nsession_timeout_ms: 6000\nfetch_workers: 8\npreload:\n  partitions: false\n  config: true\n",
    );

    let config = ConfigLoader::from_path(file.path()).unwrap();
    assert_eq!(config.address, "zk1:2181,zk2:2181/kafka");
    assert_eq!(config.session_timeout(), Some(Duration::from_secs(6)));
    assert_eq!(config.fetch_workers, 8);
    assert_eq!(
        config.preload,
        TopicPreload {
            partitions: false,
            config: true
        }
    );
}

#[test]
fn test_json_config_without_extension() {
    let file = temp_file_with(".conf", r#"{"address": "zk1:2181"}"#);

    let config = ConfigLoader::from_path(file.path()).unwrap();
    assert_eq!(config, ClusterConfig::new("zk1:2181"));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let file = temp_file_with(".json", r#"{"address": "zk1:2181", "fetch_workers": 0}"#);

    let err = ConfigLoader::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ClusterError::ConfigFile { ref context, .. } if context == "fetch_workers"));
}

#[test]
fn test_unparseable_and_missing_files() {
    let file = temp_file_with(".json", "address: [unterminated");
    assert!(matches!(
        ConfigLoader::from_path(file.path()),
        Err(ClusterError::ConfigFile { .. })
    ));

    let err = ConfigLoader::from_path("/nonexistent/keel.yaml").unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn test_snapshot_seeds_cluster() {
    let file = temp_file_with(
        ".yaml",
        r#"
/brokers/ids/1:
  host: kafka1
  port: 9092
  timestamp: "1700000000000"
/brokers/ids/2: '{"host":"kafka2","port":9093}'
/brokers/topics/orders:
  version: 1
  partitions:
    "0": [1, 2]
/brokers/topics/orders/partitions/0/state:
  leader: 2
  leader_epoch: 3
  isr: [2]
/consumers: null
"#,
    );

    let snapshot: TreeSnapshot = ConfigLoader::load(file.path()).unwrap();
    let tree = InMemoryCoordination::from_snapshot(snapshot);
    let connector = Arc::new(MemoryConnector::new(tree));
    let cluster = Cluster::new(ClusterConfig::new("snapshot"), connector).unwrap();

    let brokers = cluster.brokers().unwrap();
    assert_eq!(brokers[&BrokerId(2)].addr(), "kafka2:9093");

    let partitions = cluster.partitions().unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].leader(), Some(BrokerId(2)));
    assert!(partitions[0].has_foreign_leader());
    assert!(cluster.under_replicated().unwrap());
    assert!(cluster.consumergroups().unwrap().is_empty());
}

#[test]
fn test_invalid_config_rejected_by_cluster() {
    let connector = Arc::new(MemoryConnector::default());
    let err = Cluster::new(ClusterConfig::new(""), connector.clone()).unwrap_err();
    assert!(matches!(err, ClusterError::ConfigFile { .. }));
    assert_eq!(connector.connect_count(), 0);
}
