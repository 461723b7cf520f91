use std::{path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use keel::{
    Cluster, ClusterConfig, ConfigLoader, InMemoryCoordination, MemoryConnector, Partition,
    PartitionId, TopicPreload, TreeSnapshot, telemetry,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "keel-inspect",
    version,
    author,
    about = "Inspect Kafka cluster metadata captured from a coordination tree"
)]
struct Cli {
    /// Cluster configuration file (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tree snapshot file mapping node paths to payloads (JSON or YAML)
    #[arg(long)]
    snapshot: PathBuf,

    /// Address reported for the snapshot when no config file is given
    #[arg(long, default_value = "snapshot")]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered brokers
    Brokers,
    /// List topics with partition count and replication factor
    Topics,
    /// Show partitions of one topic
    Partitions(TopicCmd),
    /// List partitions whose ISR is smaller than their replica set
    UnderReplicated,
    /// Show the current leader of every partition
    Leaders,
    /// Show the active controller
    Controller,
    /// List consumer groups
    Groups,
    /// Show a committed consumer group offset
    Offset(OffsetCmd),
}

#[derive(Args, Debug)]
struct TopicCmd {
    #[arg(long)]
    topic: String,
}

#[derive(Args, Debug)]
struct OffsetCmd {
    #[arg(long, value_name = "GROUP")]
    group: String,
    #[arg(long)]
    topic: String,
    #[arg(long, default_value_t = 0)]
    partition: u32,
}

fn print_partition(p: &Partition) {
    let leader = p
        .leader()
        .map_or_else(|| "none".to_string(), |id| id.to_string());
    println!(
        "{}-{} leader: {} replicas: {:?} isr: {:?}",
        p.topic(),
        p.id(),
        leader,
        p.replicas().iter().map(|b| b.0).collect::<Vec<_>>(),
        p.isr().iter().map(|b| b.0).collect::<Vec<_>>()
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ConfigLoader::from_path(path)?,
        None => ClusterConfig::new(cli.address.clone()),
    };

    let snapshot: TreeSnapshot = ConfigLoader::load(&cli.snapshot)?;
    let tree = InMemoryCoordination::from_snapshot(snapshot);
    info!(
        "Loaded {} nodes from {}",
        tree.len(),
        cli.snapshot.display()
    );

    let connector = Arc::new(MemoryConnector::new(tree));
    let cluster = Cluster::new(config, connector)?;
    debug!("Inspecting cluster at {}", cluster.config().address);

    match cli.command {
        Commands::Brokers => {
            for broker in cluster.brokers()?.values() {
                print!("{} {}", broker.id(), broker.addr());
                if let Some(rack) = broker.rack() {
                    print!(" (rack: {rack})");
                }
                println!();
            }
        }
        Commands::Topics => {
            for topic in cluster.topics()?.values() {
                println!(
                    "{} partitions: {} replication_factor: {}",
                    topic.name(),
                    topic.partition_count()?,
                    topic.replication_factor()?
                );
            }
        }
        Commands::Partitions(args) => {
            let topics = cluster.topics_with_preload(TopicPreload::none())?;
            let topic = topics
                .get(&args.topic)
                .ok_or_else(|| format!("unknown topic '{}'", args.topic))?;
            for partition in topic.partitions()?.iter() {
                print_partition(partition);
            }
        }
        Commands::UnderReplicated => {
            let partitions = cluster.partitions()?;
            let lagging: Vec<_> = partitions.iter().filter(|p| p.under_replicated()).collect();
            for partition in &lagging {
                print_partition(partition);
            }
            println!("under_replicated: {}", lagging.len());
        }
        Commands::Leaders => {
            for (reference, leader) in cluster.leaders()? {
                let leader = leader.map_or_else(|| "none".to_string(), |id| id.to_string());
                println!("{}-{} {}", reference.topic, reference.partition, leader);
            }
        }
        Commands::Controller => {
            println!("controller: {}", cluster.controller()?);
        }
        Commands::Groups => {
            for group in cluster.consumergroups()?.values() {
                let state = if group.active()? { "active" } else { "inactive" };
                println!("{} {}", group.name(), state);
            }
        }
        Commands::Offset(args) => {
            let group = cluster.consumergroup(args.group);
            match group.retrieve_offset(&args.topic, PartitionId(args.partition))? {
                Some(offset) => println!("offset: {offset}"),
                None => println!("offset: none"),
            }
        }
    }
    Ok(())
}
